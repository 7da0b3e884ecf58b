//! # augment
//!
//! Randomized signal transforms for training-time data augmentation.
//!
//! Every transform implements [`Transform`] and draws fresh randomness on
//! each call. [`Pipeline`] assembles them from an [`AugmentConfig`] in a
//! fixed order:
//!
//! pitch → resample → speed → delay → distortion → EQ → allpass → crop →
//! dequantize → normalize → gain → derivative → extra transforms
//!
//! [`AugmentConfig`]: wavedb_core::AugmentConfig

pub mod crop;
pub mod delay;
pub mod derivative;
pub mod distort;
pub mod eq;
pub mod level;
pub mod phase;
pub mod pipeline;
pub mod rate;
pub mod transform;

pub use crop::RandomCrop;
pub use delay::RandomDelay;
pub use derivative::{Derivator, Integrator, derivator_integrator};
pub use distort::RandomDistort;
pub use eq::RandomEq;
pub use level::{Dequantize, Normalize, RandomGain};
pub use phase::PhaseMangle;
pub use pipeline::{Augmentation, Pipeline};
pub use rate::{RandomPitch, RandomSpeed, Resample};
pub use transform::{RandomApply, Transform};
