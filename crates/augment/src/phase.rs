//! Random allpass phase mangling.

use std::f64::consts::PI;

use audio::Biquad;
use rand::Rng;
use wavedb_core::{AudioBuffer, DatasetResult};

use crate::transform::Transform;

/// Second-order allpass at a log-uniform random frequency.
///
/// Colours phase like a room or a cabinet would, leaving the magnitude
/// spectrum intact.
#[derive(Debug, Clone, Copy)]
pub struct PhaseMangle {
    pub min_f: f64,
    pub max_f: f64,
    pub radius: f64,
    pub sample_rate: usize,
}

impl PhaseMangle {
    pub fn new(sample_rate: usize) -> Self {
        Self {
            min_f: 20.0,
            max_f: 2000.0,
            radius: 0.99,
            sample_rate,
        }
    }

    /// Draw a pole angle (radians per sample).
    pub fn random_angle<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let lo = self.min_f.ln();
        let hi = self.max_f.ln();
        let f = (rng.gen::<f64>() * (hi - lo) + lo).exp();
        2.0 * PI * f / self.sample_rate as f64
    }

    pub fn apply_with<R: Rng + ?Sized>(
        &self,
        buffer: AudioBuffer,
        rng: &mut R,
    ) -> DatasetResult<AudioBuffer> {
        let filter = Biquad::allpass(self.random_angle(rng), self.radius);
        buffer.map_channels(|ch| filter.apply(&ch))
    }
}

impl Transform for PhaseMangle {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self.apply_with(buffer, &mut rand::thread_rng())
    }

    fn name(&self) -> &str {
        "phase_mangle"
    }
}
