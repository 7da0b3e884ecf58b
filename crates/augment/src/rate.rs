//! Length-changing transforms: resampling, random speed and random pitch.

use audio::{Resampler, resample_ratio};
use rand::Rng;
use wavedb_core::{AudioBuffer, DatasetResult};

use crate::transform::Transform;

/// Resample from the dataset rate to the training rate.
#[derive(Debug, Clone, Copy)]
pub struct Resample {
    resampler: Resampler,
}

impl Resample {
    pub fn new(source_sample_rate: usize, target_sample_rate: usize) -> Self {
        Self {
            resampler: Resampler::new(source_sample_rate, target_sample_rate),
        }
    }
}

impl Transform for Resample {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self.resampler.resample(buffer)
    }

    fn name(&self) -> &str {
        "resample"
    }
}

/// Random playback-speed change within `[-semitones, semitones]`.
///
/// Changes duration: place before [`crate::RandomCrop`] and make sure the
/// pre-crop window is long enough for the largest speed-up.
#[derive(Debug, Clone, Copy)]
pub struct RandomSpeed {
    pub semitones: f32,
}

impl RandomSpeed {
    pub fn new(semitones: f32) -> Self {
        Self { semitones }
    }

    pub fn apply_with<R: Rng + ?Sized>(
        &self,
        buffer: AudioBuffer,
        rng: &mut R,
    ) -> DatasetResult<AudioBuffer> {
        let u: f64 = rng.gen();
        let rate = 2f64.powf((u * 2.0 - 1.0) * self.semitones as f64 / 12.0);
        // playing `rate` times faster shortens the signal by `rate`
        resample_ratio(buffer, 1.0 / rate)
    }
}

impl Transform for RandomSpeed {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self.apply_with(buffer, &mut rand::thread_rng())
    }

    fn name(&self) -> &str {
        "random_speed"
    }
}

/// Random pitch change by a small rational resampling ratio.
///
/// Ratios `up / down` with `1 <= up, down < max_factor` inside the pitch range
/// are tabulated once; each call draws a target factor and picks the first
/// tabulated ratio not below it. The output has `len * down / up` samples, and
/// the factor is capped at `len / n_signal` so at least `n_signal` remain.
#[derive(Debug, Clone)]
pub struct RandomPitch {
    n_signal: usize,
    pitch_range: [f32; 2],
    p: f64,
    ratios: Vec<(f64, u32, u32)>,
}

impl RandomPitch {
    pub const MAX_FACTOR: u32 = 20;

    pub fn new(n_signal: usize, pitch_range: [f32; 2], p: f64) -> Self {
        let mut ratios = Vec::new();
        for up in 1..Self::MAX_FACTOR {
            for down in 1..Self::MAX_FACTOR {
                if up == down {
                    continue;
                }
                let factor = up as f64 / down as f64;
                if factor >= pitch_range[0] as f64 && factor <= pitch_range[1] as f64 {
                    ratios.push((factor, up, down));
                }
            }
        }
        ratios.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self {
            n_signal,
            pitch_range,
            p,
            ratios,
        }
    }

    /// Tabulated `(factor, up, down)` triples, ascending by factor.
    pub fn ratios(&self) -> &[(f64, u32, u32)] {
        &self.ratios
    }

    /// Pick the ratio for a drawn `factor`.
    pub fn select(&self, factor: f64) -> Option<(u32, u32)> {
        self.select_within(factor, f64::INFINITY)
    }

    /// First tabulated ratio not below `factor`, never above `max_factor`.
    ///
    /// Falls back to the largest ratio not above `max_factor`.
    pub fn select_within(&self, factor: f64, max_factor: f64) -> Option<(u32, u32)> {
        if self.ratios.is_empty() {
            return None;
        }
        let mut idx = self
            .ratios
            .partition_point(|r| r.0 < factor)
            .min(self.ratios.len() - 1);
        if self.ratios[idx].0 > max_factor {
            idx = self.ratios.partition_point(|r| r.0 <= max_factor).checked_sub(1)?;
        }
        let (_, up, down) = self.ratios[idx];
        Some((up, down))
    }

    pub fn apply_with<R: Rng + ?Sized>(
        &self,
        buffer: AudioBuffer,
        rng: &mut R,
    ) -> DatasetResult<AudioBuffer> {
        if !rng.gen_bool(self.p.clamp(0.0, 1.0)) {
            return Ok(buffer);
        }
        let lo = self.pitch_range[0] as f64;
        // never stretch past what the available signal can cover
        let hi = (self.pitch_range[1] as f64)
            .min(buffer.num_samples() as f64 / self.n_signal.max(1) as f64);
        let factor = rng.gen::<f64>() * (hi - lo) + lo;
        match self.select_within(factor, hi) {
            // raising the pitch by up/down shortens the signal by the same factor
            Some((up, down)) => resample_ratio(buffer, down as f64 / up as f64),
            None => Ok(buffer),
        }
    }
}

impl Transform for RandomPitch {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self.apply_with(buffer, &mut rand::thread_rng())
    }

    fn name(&self) -> &str {
        "random_pitch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_pitch_table_sorted_and_in_range() {
        let pitch = RandomPitch::new(4096, [0.7, 1.3], 1.0);
        let ratios = pitch.ratios();
        assert!(!ratios.is_empty());
        assert!(ratios.windows(2).all(|w| w[0].0 <= w[1].0));
        assert!(ratios.iter().all(|r| r.0 >= 0.7 && r.0 <= 1.3 && r.1 != r.2));
    }

    #[test]
    fn test_pitch_select_clamps_to_last() {
        let pitch = RandomPitch::new(4096, [0.7, 1.3], 1.0);
        let (up, down) = pitch.select(10.0).unwrap();
        let last = pitch.ratios().last().unwrap();
        assert_eq!((up, down), (last.1, last.2));
    }

    #[test]
    fn test_pitch_disabled_is_identity() {
        let pitch = RandomPitch::new(16, [0.7, 1.3], 0.0);
        let buffer = AudioBuffer::mono(vec![0.25; 64], 16000);
        assert_eq!(pitch.apply(buffer.clone()).unwrap(), buffer);
    }

    #[test]
    fn test_pitch_select_respects_cap() {
        let pitch = RandomPitch::new(4096, [0.7, 1.3], 1.0);
        let (up, down) = pitch.select_within(1.25, 1.0).unwrap();
        assert!(up < down);
        assert_eq!(pitch.select_within(0.9, 0.5), None);
    }

    #[test]
    fn test_pitch_keeps_enough_samples() {
        let mut rng = StdRng::seed_from_u64(3);
        let pitch = RandomPitch::new(1000, [0.7, 1.3], 1.0);
        for len in [1000, 1100, 1300] {
            for _ in 0..20 {
                let buffer = AudioBuffer::mono(vec![0.1; len], 16000);
                let out = pitch.apply_with(buffer, &mut rng).unwrap();
                assert!(out.num_samples() >= 1000, "{} samples from {len}", out.num_samples());
                assert!(out.num_samples() as f64 <= len as f64 / 0.7 + 1.0);
            }
        }
    }

    #[test]
    fn test_speed_length_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let speed = RandomSpeed::new(12.0);
        for _ in 0..4 {
            let buffer = AudioBuffer::mono(vec![0.0; 8192], 44100);
            let out = speed.apply_with(buffer, &mut rng).unwrap();
            // one octave either way
            assert!(out.num_samples() >= 4096 && out.num_samples() <= 16384);
        }
    }
}
