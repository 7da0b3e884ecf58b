//! Transform trait and probability gating.

use rand::Rng;
use wavedb_core::{AudioBuffer, DatasetResult};

/// A unary signal transform applied to one window.
///
/// Input and output have the same channel count; length and amplitude range
/// may change.
pub trait Transform: Send + Sync {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "transform"
    }
}

impl<F> Transform for F
where
    F: Fn(AudioBuffer) -> DatasetResult<AudioBuffer> + Send + Sync,
{
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self(buffer)
    }

    fn name(&self) -> &str {
        "closure"
    }
}

/// Apply the inner transform with probability `p`.
#[derive(Debug, Clone)]
pub struct RandomApply<T> {
    pub inner: T,
    pub p: f64,
}

impl<T: Transform> RandomApply<T> {
    pub fn new(inner: T, p: f64) -> Self {
        Self { inner, p }
    }

    pub fn apply_with<R: Rng + ?Sized>(
        &self,
        buffer: AudioBuffer,
        rng: &mut R,
    ) -> DatasetResult<AudioBuffer> {
        if self.p > 0.0 && rng.gen_bool(self.p.min(1.0)) {
            self.inner.apply(buffer)
        } else {
            Ok(buffer)
        }
    }
}

impl<T: Transform> Transform for RandomApply<T> {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self.apply_with(buffer, &mut rand::thread_rng())
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invert(buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        Ok(buffer.scale(-1.0))
    }

    #[test]
    fn test_random_apply_extremes() {
        let buffer = AudioBuffer::mono(vec![0.5; 4], 16000);

        let never = RandomApply::new(invert, 0.0);
        assert_eq!(never.apply(buffer.clone()).unwrap(), buffer);

        let always = RandomApply::new(invert, 1.0);
        assert_eq!(always.apply(buffer).unwrap().channel(0), &[-0.5; 4]);
    }
}
