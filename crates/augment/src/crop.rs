//! Fixed-length random crop.

use rand::Rng;
use tracing::debug;
use wavedb_core::{AudioBuffer, DatasetResult};

use crate::transform::Transform;

/// Crop a random `n_signal`-sample segment.
///
/// Must run after every length-changing stage. Input shorter than
/// `n_signal` is zero padded on the right so the output shape is exact.
#[derive(Debug, Clone, Copy)]
pub struct RandomCrop {
    pub n_signal: usize,
}

impl RandomCrop {
    pub fn new(n_signal: usize) -> Self {
        Self { n_signal }
    }

    pub fn apply_with<R: Rng + ?Sized>(
        &self,
        buffer: AudioBuffer,
        rng: &mut R,
    ) -> DatasetResult<AudioBuffer> {
        let n = buffer.num_samples();
        if n < self.n_signal {
            debug!(
                samples = n,
                n_signal = self.n_signal,
                "window shorter than crop, zero padding"
            );
            let target = self.n_signal;
            return buffer.map_channels(|mut ch| {
                ch.resize(target, 0.0);
                ch
            });
        }
        let start = rng.gen_range(0..=n - self.n_signal);
        buffer.slice(start, self.n_signal)
    }
}

impl Transform for RandomCrop {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self.apply_with(buffer, &mut rand::thread_rng())
    }

    fn name(&self) -> &str {
        "random_crop"
    }
}
