//! Audio resampling.

use rubato::{
    FftFixedInOut, Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};
use tracing::debug;
use wavedb_core::{AudioBuffer, DatasetError, DatasetResult};

/// Audio resampler for converting between two sample rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resampler {
    source_sample_rate: usize,
    target_sample_rate: usize,
}

impl Resampler {
    /// Create a resampler from `source_sample_rate` to `target_sample_rate`.
    pub fn new(source_sample_rate: usize, target_sample_rate: usize) -> Self {
        Self {
            source_sample_rate,
            target_sample_rate,
        }
    }

    pub fn target_sample_rate(&self) -> usize {
        self.target_sample_rate
    }

    /// Resample every channel of `buffer` to the target rate.
    pub fn resample(&self, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
        if self.source_sample_rate == self.target_sample_rate || buffer.num_samples() == 0 {
            let mut buffer = buffer;
            buffer.sample_rate = self.target_sample_rate;
            return Ok(buffer);
        }

        let channels = buffer.num_channels();
        let total = buffer.num_samples();
        let ratio = self.target_sample_rate as f64 / self.source_sample_rate as f64;

        let mut resampler = FftFixedInOut::<f32>::new(
            self.source_sample_rate,
            self.target_sample_rate,
            1024,
            channels,
        )
        .map_err(|e| DatasetError::Audio(format!("Failed to create resampler: {}", e)))?;
        debug!(
            from = self.source_sample_rate,
            to = self.target_sample_rate,
            chunk = resampler.input_frames_next(),
            delay = resampler.output_delay(),
            "fft resampler ready"
        );

        let expected_len = (total as f64 * ratio).round() as usize;
        let output = run_chunks(&mut resampler, &buffer.into_channels(), ratio, expected_len)?;

        AudioBuffer::new(output, self.target_sample_rate)
    }
}

/// Resample by an arbitrary `ratio` (output length / input length).
///
/// The sample rate label of the buffer is kept: used for speed and pitch
/// changes, where the signal is played back at the original rate.
pub fn resample_ratio(buffer: AudioBuffer, ratio: f64) -> DatasetResult<AudioBuffer> {
    if !(ratio.is_finite() && ratio > 0.0) {
        return Err(DatasetError::Audio(format!("invalid resample ratio {ratio}")));
    }
    if (ratio - 1.0).abs() < 1e-9 || buffer.num_samples() == 0 {
        return Ok(buffer);
    }

    let sample_rate = buffer.sample_rate;
    let channels = buffer.num_channels();
    let total = buffer.num_samples();

    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.925,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };
    let chunk_size = 1024;
    let max_ratio = ratio.max(1.0 / ratio) * 1.1;

    let mut resampler = SincFixedIn::<f32>::new(ratio, max_ratio, params, chunk_size, channels)
        .map_err(|e| DatasetError::Audio(format!("Failed to create resampler: {}", e)))?;

    let expected_len = ((total as f64 * ratio).round() as usize).max(1);
    let output = run_chunks(&mut resampler, &buffer.into_channels(), ratio, expected_len)?;

    AudioBuffer::new(output, sample_rate)
}

/// Feed `input` through `resampler` in zero-padded chunks.
///
/// The resampler's output delay is dropped from the front and zero chunks are
/// pushed after the input until the tail is flushed, so the result is aligned
/// with the input and holds exactly `expected_len` frames per channel.
fn run_chunks<R: RubatoResampler<f32>>(
    resampler: &mut R,
    input: &[Vec<f32>],
    ratio: f64,
    expected_len: usize,
) -> DatasetResult<Vec<Vec<f32>>> {
    let total = input.first().map_or(0, Vec::len);
    let delay = resampler.output_delay();
    let needed = delay + expected_len;
    // bound on the input frames needed to flush the delay line
    let limit = total + (delay as f64 / ratio).ceil() as usize + 2 * resampler.input_frames_max();

    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(needed); input.len()];
    let mut pos = 0;
    while output.first().map_or(0, Vec::len) < needed && pos < limit {
        let chunk_size = resampler.input_frames_next();
        let start = pos.min(total);
        let end = (pos + chunk_size).min(total);
        let chunk: Vec<Vec<f32>> = input
            .iter()
            .map(|ch| {
                let mut part = ch[start..end].to_vec();
                part.resize(chunk_size, 0.0);
                part
            })
            .collect();
        let processed = resampler
            .process(&chunk, None)
            .map_err(|e| DatasetError::Audio(format!("Resampling failed: {}", e)))?;
        for (out, res) in output.iter_mut().zip(processed) {
            out.extend_from_slice(&res);
        }
        pos += chunk_size;
    }

    for out in &mut output {
        out.drain(..delay.min(out.len()));
        out.resize(expected_len, 0.0);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(len: usize, sample_rate: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_resampler_no_change() {
        let buffer = AudioBuffer::mono(vec![0.0; 1024], 16000);
        let result = Resampler::new(16000, 16000).resample(buffer.clone()).unwrap();

        assert_eq!(result.sample_rate, 16000);
        assert_eq!(result.num_samples(), buffer.num_samples());
    }

    #[test]
    fn test_resampler_downsample_stereo() {
        let ch = sine(48000, 48000);
        let buffer = AudioBuffer::new(vec![ch.clone(), ch], 48000).unwrap();
        let result = Resampler::new(48000, 24000).resample(buffer).unwrap();

        assert_eq!(result.sample_rate, 24000);
        assert_eq!(result.shape(), (2, 24000));
    }

    #[test]
    fn test_resampler_compensates_delay() {
        let buffer = AudioBuffer::mono(vec![0.5; 48000], 48000);
        let result = Resampler::new(48000, 24000).resample(buffer).unwrap();
        let out = result.channel(0);

        assert_eq!(out.len(), 24000);
        assert!(out[16..256].iter().all(|v| *v > 0.4), "leading silence");
        assert!(out[32..out.len() - 32].iter().all(|v| (v - 0.5).abs() < 0.05));
        assert!(out[out.len() - 256..out.len() - 16].iter().all(|v| *v > 0.4), "tail lost");
    }

    #[test]
    fn test_resample_ratio_compensates_delay() {
        let buffer = AudioBuffer::mono(vec![0.5; 8192], 44100);
        let result = resample_ratio(buffer, 1.25).unwrap();
        let out = result.channel(0);

        assert_eq!(out.len(), 10240);
        assert!(out[16..256].iter().all(|v| *v > 0.4), "leading silence");
        assert!(out[out.len() - 256..out.len() - 16].iter().all(|v| *v > 0.4), "tail lost");
    }

    #[test]
    fn test_resample_ratio_length() {
        let buffer = AudioBuffer::mono(sine(10000, 44100), 44100);
        let result = resample_ratio(buffer, 0.5).unwrap();

        assert_eq!(result.num_samples(), 5000);
        assert_eq!(result.sample_rate, 44100);
    }

    #[test]
    fn test_resample_ratio_rejects_zero() {
        let buffer = AudioBuffer::mono(vec![0.0; 16], 16000);
        assert!(resample_ratio(buffer, 0.0).is_err());
    }
}
