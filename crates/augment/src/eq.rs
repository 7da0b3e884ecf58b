//! Random parametric EQ.
//!
//! Roughly simulates electric guitar body and pickup resonances plus tone
//! control: a low-pass, a low shelf and a few band boosts/cuts.

use audio::Biquad;
use rand::Rng;
use wavedb_core::{AudioBuffer, DatasetResult};

use crate::transform::Transform;

#[derive(Debug, Clone, Copy)]
pub struct RandomEq {
    pub sample_rate: usize,
    /// Probability of the low-pass filter.
    pub p_lp: f64,
    /// Probability of each band filter.
    pub p_bp: f64,
    /// Number of band filters.
    pub n_bp: usize,
    /// Probability of the low shelf.
    pub p_ls: f64,
}

impl RandomEq {
    pub fn new(sample_rate: usize) -> Self {
        Self {
            sample_rate,
            p_lp: 0.75,
            p_bp: 0.5,
            n_bp: 2,
            p_ls: 0.5,
        }
    }

    pub fn apply_with<R: Rng + ?Sized>(
        &self,
        buffer: AudioBuffer,
        rng: &mut R,
    ) -> DatasetResult<AudioBuffer> {
        let sr = self.sample_rate as f64;
        let mut x = buffer;

        if rng.gen_bool(self.p_lp) {
            // 80 Hz .. 20 kHz
            let f = 80.0 * 2f64.powf(8.0 * rng.gen::<f64>());
            if let Some(lp) = Biquad::butter_lowpass(f, sr) {
                x = x.map_channels(|ch| lp.apply(&ch))?;
            }
        }

        if rng.gen_bool(self.p_ls) {
            // 40 .. 640 Hz; shelf depth sqrt(u): median about -11 dB
            let f = 40.0 * 2f64.powf(4.0 * rng.gen::<f64>());
            let w = rng.gen::<f64>().sqrt() as f32;
            if let Some(lp) = Biquad::butter_lowpass(f, sr) {
                x = x.map_channels(|ch| {
                    let low = lp.apply(&ch);
                    ch.iter().zip(low).map(|(v, l)| v - w * l).collect()
                })?;
            }
        }

        for _ in 0..self.n_bp {
            if rng.gen_bool(self.p_bp) {
                // 160 Hz .. 5 kHz centre, gain in [-1, 3]: notch up to +9.5 dB
                let f = 160.0 * 2f64.powf(5.0 * rng.gen::<f64>());
                let w = (rng.gen::<f64>().powi(2) * 4.0 - 1.0) as f32;
                if let Some(bp) = Biquad::butter_bandpass(f * 2.0 / 3.0, f * 3.0 / 2.0, sr) {
                    x = x.map_channels(|ch| {
                        let band = bp.apply(&ch);
                        ch.iter().zip(band).map(|(v, b)| v + w * b).collect()
                    })?;
                }
            }
        }

        Ok(x)
    }
}

impl Transform for RandomEq {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self.apply_with(buffer, &mut rand::thread_rng())
    }

    fn name(&self) -> &str {
        "random_eq"
    }
}
