//! Derivative filter and its matching leaky integrator.
//!
//! Training on the derivative of the signal inserts [`Derivator`] at the end
//! of the pipeline; the model side undoes it with [`Integrator`].

use std::f64::consts::PI;

use audio::lfilter;
use wavedb_core::{AudioBuffer, DatasetResult};

use crate::transform::Transform;

/// First difference `y[n] = (x[n] - x[n-1]) / 2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Derivator;

impl Transform for Derivator {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        buffer.map_channels(|ch| lfilter(&[0.5, -0.5], &[1.0], &ch))
    }

    fn name(&self) -> &str {
        "derivative"
    }
}

/// Leaky double integrator with a 10 Hz corner.
#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    alpha: f64,
}

impl Integrator {
    pub fn new(sample_rate: usize) -> Self {
        Self {
            alpha: 1.0 / (1.0 + 2.0 * PI * 10.0 / sample_rate as f64),
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Transform for Integrator {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        let a2 = self.alpha * self.alpha;
        let b = [a2, -a2];
        let a = [1.0, -2.0 * self.alpha, a2];
        buffer.map_channels(|ch| lfilter(&b, &a, &ch))
    }

    fn name(&self) -> &str {
        "integrator"
    }
}

/// The derivator/integrator pair for a sample rate.
pub fn derivator_integrator(sample_rate: usize) -> (Derivator, Integrator) {
    (Derivator, Integrator::new(sample_rate))
}
