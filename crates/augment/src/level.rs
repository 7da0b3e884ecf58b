//! Level stages: dequantization dither, peak normalisation, random gain.

use rand::Rng;
use wavedb_core::{AudioBuffer, DatasetResult};

use crate::transform::Transform;

/// Add uniform noise of one LSB at `bit_depth` to hide quantization steps.
#[derive(Debug, Clone, Copy)]
pub struct Dequantize {
    pub bit_depth: u32,
}

impl Dequantize {
    pub fn new(bit_depth: u32) -> Self {
        Self { bit_depth }
    }

    pub fn apply_with<R: Rng + ?Sized>(
        &self,
        buffer: AudioBuffer,
        rng: &mut R,
    ) -> DatasetResult<AudioBuffer> {
        let lsb = 1.0 / 2f64.powi(self.bit_depth as i32);
        buffer.map_channels(|mut ch| {
            for v in &mut ch {
                *v += (rng.gen::<f64>() * lsb) as f32;
            }
            ch
        })
    }
}

impl Transform for Dequantize {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self.apply_with(buffer, &mut rand::thread_rng())
    }

    fn name(&self) -> &str {
        "dequantize"
    }
}

/// Peak normalisation to 0 dBFS, with the gain capped at `max_gain_db`.
#[derive(Debug, Clone, Copy)]
pub struct Normalize {
    pub max_gain_db: f32,
}

impl Default for Normalize {
    fn default() -> Self {
        Self { max_gain_db: 30.0 }
    }
}

impl Normalize {
    pub fn new(max_gain_db: f32) -> Self {
        Self { max_gain_db }
    }
}

impl Transform for Normalize {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        let peak = buffer.peak();
        if peak == 0.0 {
            return Ok(buffer);
        }
        let log_gain = self.max_gain_db.min(-20.0 * peak.log10());
        Ok(buffer.scale(10f32.powf(log_gain / 20.0)))
    }

    fn name(&self) -> &str {
        "normalize"
    }
}

/// Random gain in `[-db, db]`, upper bound lowered so the peak stays below 1.
#[derive(Debug, Clone, Copy)]
pub struct RandomGain {
    pub db: f32,
}

impl RandomGain {
    pub fn new(db: f32) -> Self {
        Self { db }
    }

    /// Gain range in dB for a signal with the given peak.
    pub fn db_range(&self, peak: f32) -> (f32, f32) {
        let max_db = self.db.min(20.0 * (1.0 / (peak + 1e-5)).log10());
        // a peak above 1 makes max_db negative, keep min <= max
        let min_db = (-self.db).min(max_db);
        (min_db, max_db)
    }

    pub fn apply_with<R: Rng + ?Sized>(
        &self,
        buffer: AudioBuffer,
        rng: &mut R,
    ) -> DatasetResult<AudioBuffer> {
        let (min_db, max_db) = self.db_range(buffer.peak());
        let db = rng.gen::<f32>() * (max_db - min_db) + min_db;
        Ok(buffer.scale(10f32.powf(db / 20.0)))
    }
}

impl Transform for RandomGain {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self.apply_with(buffer, &mut rand::thread_rng())
    }

    fn name(&self) -> &str {
        "random_gain"
    }
}
