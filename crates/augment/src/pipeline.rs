//! Ordered, configuration-driven augmentation pipeline.

use tracing::debug;
use wavedb_core::{AudioBuffer, AugmentConfig, DatasetResult};

use crate::crop::RandomCrop;
use crate::delay::RandomDelay;
use crate::derivative::Derivator;
use crate::distort::RandomDistort;
use crate::eq::RandomEq;
use crate::level::{Dequantize, Normalize, RandomGain};
use crate::phase::PhaseMangle;
use crate::rate::{RandomPitch, RandomSpeed, Resample};
use crate::transform::{RandomApply, Transform};

/// One pipeline stage.
pub enum Augmentation {
    Pitch(RandomPitch),
    Resample(Resample),
    Speed(RandomSpeed),
    Delay(RandomApply<RandomDelay>),
    Distort(RandomApply<RandomDistort>),
    Eq(RandomApply<RandomEq>),
    PhaseMangle(RandomApply<PhaseMangle>),
    Crop(RandomCrop),
    Dequantize(Dequantize),
    Normalize(Normalize),
    Gain(RandomGain),
    Derivative(Derivator),
    /// Caller-supplied transform, appended after the built-in stages.
    Extra(Box<dyn Transform>),
}

impl Augmentation {
    fn as_transform(&self) -> &dyn Transform {
        match self {
            Augmentation::Pitch(t) => t,
            Augmentation::Resample(t) => t,
            Augmentation::Speed(t) => t,
            Augmentation::Delay(t) => t,
            Augmentation::Distort(t) => t,
            Augmentation::Eq(t) => t,
            Augmentation::PhaseMangle(t) => t,
            Augmentation::Crop(t) => t,
            Augmentation::Dequantize(t) => t,
            Augmentation::Normalize(t) => t,
            Augmentation::Gain(t) => t,
            Augmentation::Derivative(t) => t,
            Augmentation::Extra(t) => &**t,
        }
    }
}

impl Transform for Augmentation {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self.as_transform().apply(buffer)
    }

    fn name(&self) -> &str {
        self.as_transform().name()
    }
}

impl std::fmt::Debug for Augmentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Augmentation({})", self.name())
    }
}

/// Immutable chain of augmentations built once per dataset.
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<Augmentation>,
}

impl Pipeline {
    /// Build the chain for `config`.
    ///
    /// `dataset_sample_rate` is the rate windows are extracted at; a resample
    /// stage is inserted when it differs from `config.sample_rate`. `extra`
    /// transforms run last, in the given order.
    pub fn build(
        config: &AugmentConfig,
        dataset_sample_rate: usize,
        extra: Vec<Box<dyn Transform>>,
    ) -> DatasetResult<Self> {
        config.validate()?;
        let sr = config.sample_rate;
        let mut stages = Vec::new();

        if let Some(range) = config.rand_pitch {
            stages.push(Augmentation::Pitch(RandomPitch::new(
                config.n_signal,
                range,
                config.pitch_p,
            )));
        }
        if dataset_sample_rate != sr {
            stages.push(Augmentation::Resample(Resample::new(dataset_sample_rate, sr)));
        }
        if config.speed_semitones > 0.0 {
            stages.push(Augmentation::Speed(RandomSpeed::new(config.speed_semitones)));
        }
        if config.delay_p > 0.0 {
            stages.push(Augmentation::Delay(RandomApply::new(
                RandomDelay::new(config.max_delay),
                config.delay_p,
            )));
        }
        if config.distort_p > 0.0 {
            stages.push(Augmentation::Distort(RandomApply::new(
                RandomDistort::new(sr, config.max_drive),
                config.distort_p,
            )));
        }
        if config.eq_p > 0.0 {
            stages.push(Augmentation::Eq(RandomApply::new(
                RandomEq::new(sr),
                config.eq_p,
            )));
        }
        // the pole angle is drawn against the dataset rate
        stages.push(Augmentation::PhaseMangle(RandomApply::new(
            PhaseMangle::new(dataset_sample_rate),
            config.allpass_p,
        )));
        stages.push(Augmentation::Crop(RandomCrop::new(config.n_signal)));
        stages.push(Augmentation::Dequantize(Dequantize::new(config.dequantize_bits)));
        if config.normalize {
            stages.push(Augmentation::Normalize(Normalize::new(
                config.normalize_max_gain_db,
            )));
        }
        if config.gain_db > 0.0 {
            stages.push(Augmentation::Gain(RandomGain::new(config.gain_db)));
        }
        if config.derivative {
            stages.push(Augmentation::Derivative(Derivator));
        }
        stages.extend(extra.into_iter().map(Augmentation::Extra));

        let pipeline = Self { stages };
        debug!(stages = ?pipeline.stage_names(), "augmentation pipeline built");
        Ok(pipeline)
    }

    pub fn stages(&self) -> &[Augmentation] {
        &self.stages
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(Augmentation::name).collect()
    }

    /// Run every stage on `buffer`.
    pub fn process(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self.stages
            .iter()
            .try_fold(buffer, |buffer, stage| stage.apply(buffer))
    }
}

impl Transform for Pipeline {
    fn apply(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        self.process(buffer)
    }

    fn name(&self) -> &str {
        "pipeline"
    }
}
