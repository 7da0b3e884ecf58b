//! Random short comb-filtering delay.

use rand::Rng;
use wavedb_core::{AudioBuffer, DatasetResult};

use crate::transform::Transform;

/// Mix the signal with a fractionally delayed copy of itself.
///
/// The output is shorter than the input by `floor(d) + 2` samples, where `d`
/// is the drawn delay; place before [`crate::RandomCrop`] and keep the pre-crop
/// window at least `max_delay` samples longer than the crop.
#[derive(Debug, Clone, Copy)]
pub struct RandomDelay {
    pub max_delay: usize,
}

impl Default for RandomDelay {
    fn default() -> Self {
        Self { max_delay: 1024 }
    }
}

impl RandomDelay {
    pub fn new(max_delay: usize) -> Self {
        Self { max_delay }
    }

    /// Apply with an explicit delay `d` (samples) and wet gain `mix`.
    pub fn apply_delay(&self, buffer: AudioBuffer, d: f64, mix: f32) -> DatasetResult<AudioBuffer> {
        let whole = d.floor() as usize;
        let frac = (d - d.floor()) as f32;
        let head = whole + 2;
        let n = buffer.num_samples();
        if n <= head {
            return Ok(buffer);
        }
        buffer.map_channels(|x| {
            (0..n - head)
                .map(|i| {
                    // x[i + head] is "now"; x[i + 2] lags it by `whole` samples
                    let delayed = x[i + 2] * (1.0 - frac) + x[i + 1] * frac;
                    x[i + head] + delayed * mix
                })
                .collect()
        })
    }

    pub fn apply_with<R: Rng + ?Sized>(
        &self,
        buffer: AudioBuffer,
        rng: &mut R,
    ) -> DatasetResult<AudioBuffer> {
        let d = rng.gen::<f64>() * (self.max_delay.saturating_sub(1)) as f64;
        let mix = (rng.gen::<f32>() * 2.0 - 1.0).powi(3);
        self.apply_delay(buffer, d, mix)
    }
}

impl Transform for RandomDelay {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self.apply_with(buffer, &mut rand::thread_rng())
    }

    fn name(&self) -> &str {
        "random_delay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_delay_impulse() {
        let mut x = vec![0.0_f32; 32];
        x[0] = 1.0;
        let out = RandomDelay::new(16)
            .apply_delay(AudioBuffer::mono(x, 16000), 3.0, 0.5)
            .unwrap();
        // head = 5: output[i] = x[i + 5] + 0.5 x[i + 2], so x[0] never reaches the output
        assert_eq!(out.num_samples(), 27);
        assert!(out.channel(0).iter().all(|v| *v == 0.0));

        let mut x = vec![0.0_f32; 32];
        x[10] = 1.0;
        let out = RandomDelay::new(16)
            .apply_delay(AudioBuffer::mono(x, 16000), 3.0, 0.5)
            .unwrap();
        assert_eq!(out.channel(0)[5], 1.0);
        assert_eq!(out.channel(0)[8], 0.5);
    }

    #[test]
    fn test_short_input_untouched() {
        let buffer = AudioBuffer::mono(vec![1.0; 4], 16000);
        let out = RandomDelay::new(16).apply_delay(buffer.clone(), 5.0, 1.0).unwrap();
        assert_eq!(out, buffer);
    }
}
