//! # audio
//!
//! Audio processing module for wavedb.
//!
//! This crate handles:
//! - 16-bit PCM decoding into float buffers and WAV writing
//! - Resampling between sample rates and by arbitrary ratios
//! - IIR filtering (`lfilter`) and first-order Butterworth designs

pub mod filter;
pub mod loader;
pub mod resample;

pub use filter::{Biquad, lfilter};
pub use loader::{pcm16_to_f32, save_wav};
pub use resample::{Resampler, resample_ratio};
