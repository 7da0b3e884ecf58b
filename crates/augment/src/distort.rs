//! Random distortion: EQ colouring, normalisation, `tanh` drive, dry/wet mix.

use rand::Rng;
use wavedb_core::{AudioBuffer, DatasetResult};

use crate::eq::RandomEq;
use crate::transform::Transform;

/// Upper bound of the pre-drive normalisation gain.
const MAX_NORM_GAIN: f32 = 32.0;

#[derive(Debug, Clone, Copy)]
pub struct RandomDistort {
    pub eq: RandomEq,
    pub max_drive: f32,
}

impl RandomDistort {
    pub fn new(sample_rate: usize, max_drive: f32) -> Self {
        Self {
            eq: RandomEq::new(sample_rate),
            max_drive,
        }
    }

    pub fn apply_with<R: Rng + ?Sized>(
        &self,
        buffer: AudioBuffer,
        rng: &mut R,
    ) -> DatasetResult<AudioBuffer> {
        let mix = rng.gen::<f32>().powi(2);
        let coloured = self.eq.apply_with(buffer.clone(), rng)?;

        let peak = coloured.peak();
        let norm = if peak > 0.0 {
            (1.0 / peak).min(MAX_NORM_GAIN)
        } else {
            MAX_NORM_GAIN
        };
        let drive = 0.25 + rng.gen::<f32>().powi(3) * (self.max_drive - 0.25);

        let wet = coloured.into_channels();
        let dry = buffer.into_channels();
        let mixed = wet
            .into_iter()
            .zip(dry)
            .map(|(w, d)| {
                w.iter()
                    .zip(d)
                    .map(|(wv, dv)| (wv * norm * drive).tanh() / norm * mix + dv * (1.0 - mix))
                    .collect()
            })
            .collect();
        AudioBuffer::new(mixed, self.eq.sample_rate)
    }
}

impl Transform for RandomDistort {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self.apply_with(buffer, &mut rand::thread_rng())
    }

    fn name(&self) -> &str {
        "random_distort"
    }
}
