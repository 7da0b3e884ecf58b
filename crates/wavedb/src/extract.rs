//! Window extraction from store records.
//!
//! Eager records carry the whole int16 signal; lazy records carry a source
//! path that is decoded through a [`Decoder`] one channel at a time.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use audio::loader::{DECODER_PCM_SCALE, EAGER_PCM_SCALE};
use audio::pcm16_to_f32;
use tracing::debug;
use wavedb_core::{debug as verbose, AudioBuffer, DatasetError, DatasetResult, DecodeRequest, Decoder};

use crate::record::AudioRecord;

/// Environment variable overriding the ffmpeg binary.
pub const FFMPEG_ENV: &str = "WAVEDB_FFMPEG";

/// Source channel for every destination channel.
///
/// With fewer source channels than requested the source channels are repeated
/// and truncated (`1 → 2` gives `[0, 0]`, `2 → 3` gives `[0, 1, 0]`).
/// Channels are duplicated, never mixed.
pub fn channel_map(source_channels: usize, target_channels: usize) -> Vec<usize> {
    if source_channels == 0 || source_channels >= target_channels {
        return (0..target_channels).collect();
    }
    (0..source_channels).cycle().take(target_channels).collect()
}

/// Whole eager record as a `(channels, -1)` buffer.
pub fn extract_eager(
    record: &AudioRecord,
    audio_key: &str,
    channels: usize,
    sample_rate: usize,
) -> DatasetResult<AudioBuffer> {
    let samples = pcm16_to_f32(record.pcm16(audio_key)?, EAGER_PCM_SCALE)?;
    AudioBuffer::from_planar(samples, channels, sample_rate)
}

/// Arguments of one lazy extraction.
#[derive(Debug, Clone, Copy)]
pub struct LazyWindow<'a> {
    pub path: &'a Path,
    pub n_signal: usize,
    pub sample_rate: usize,
    pub start_sample: usize,
    pub source_channels: usize,
    pub target_channels: usize,
}

impl LazyWindow<'_> {
    /// Samples per channel in the extracted buffer.
    pub fn output_len(&self) -> usize {
        2 * self.n_signal
    }
}

/// Decode a `2 * n_signal` window starting at `start_sample`.
///
/// Short decodes (end of file) are zero padded on the right. A decoder that
/// returns nothing is an [`DatasetError::Extraction`].
pub fn extract_lazy(decoder: &dyn Decoder, window: &LazyWindow<'_>) -> DatasetResult<AudioBuffer> {
    let sr = window.sample_rate as f64;
    let len = window.output_len();
    let start_secs = window.start_sample as f64 / sr;
    let duration_secs = len as f64 / sr;

    let mut channels = Vec::with_capacity(window.target_channels);
    for channel in channel_map(window.source_channels, window.target_channels) {
        let request = DecodeRequest {
            path: window.path,
            sample_rate: window.sample_rate,
            start_secs,
            duration_secs,
            channel,
        };
        let bytes = decoder.decode(&request)?;
        if bytes.is_empty() {
            return Err(DatasetError::Extraction(format!(
                "decoder returned no audio for {} (channel {channel}, start {start_secs:.3}s)",
                window.path.display()
            )));
        }
        let mut samples = pcm16_to_f32(&bytes, DECODER_PCM_SCALE)?;
        samples.resize(len, 0.0);
        channels.push(samples);
    }
    AudioBuffer::new(channels, window.sample_rate)
}

/// [`Decoder`] running the `ffmpeg` command line tool.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    binary: PathBuf,
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegDecoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Binary from `WAVEDB_FFMPEG`, else `ffmpeg` from `PATH`.
    pub fn from_env() -> Self {
        match std::env::var_os(FFMPEG_ENV) {
            Some(binary) if !binary.is_empty() => Self::new(binary),
            _ => Self::default(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Command line arguments for one request.
    pub fn args(request: &DecodeRequest<'_>) -> Vec<String> {
        vec![
            "-v".into(),
            "error".into(),
            "-ss".into(),
            request.start_secs.to_string(),
            "-i".into(),
            request.path.display().to_string(),
            "-ar".into(),
            request.sample_rate.to_string(),
            "-filter_complex".into(),
            format!("channelmap={}-0", request.channel),
            "-t".into(),
            request.duration_secs.to_string(),
            "-f".into(),
            "s16le".into(),
            "-".into(),
        ]
    }
}

impl Decoder for FfmpegDecoder {
    fn decode(&self, request: &DecodeRequest<'_>) -> DatasetResult<Vec<u8>> {
        let args = Self::args(request);
        debug!(path = %request.path.display(), channel = request.channel, start = request.start_secs, "ffmpeg decode");
        if verbose::enabled() {
            debug!("{} {}", self.binary.display(), args.join(" "));
        }

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                DatasetError::Extraction(format!("cannot run {}: {e}", self.binary.display()))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(DatasetError::Extraction(format!(
                "{} exited with {} for {}: {}",
                self.binary.display(),
                output.status,
                request.path.display(),
                stderr.trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(DatasetError::Extraction(format!(
                "{} produced no audio for {}",
                self.binary.display(),
                request.path.display()
            )));
        }
        if verbose::enabled() && !stderr.trim().is_empty() {
            debug!("ffmpeg stderr: {}", stderr.trim());
        }
        Ok(output.stdout)
    }
}
