//! PCM decoding and WAV writing.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use wavedb_core::{AudioBuffer, DatasetError, DatasetResult};

/// Full-scale divisor used for pre-extracted (eager) buffers.
pub const EAGER_PCM_SCALE: f32 = 32767.0;

/// Full-scale divisor used for buffers produced by the external decoder.
pub const DECODER_PCM_SCALE: f32 = 32768.0;

/// Convert little-endian `i16` bytes to floats, dividing by `scale`.
///
/// A trailing odd byte is a truncated sample and is reported as `Decode`.
pub fn pcm16_to_f32(bytes: &[u8], scale: f32) -> DatasetResult<Vec<f32>> {
    if bytes.len() % 2 != 0 {
        return Err(DatasetError::Decode(format!(
            "PCM16 buffer has odd length {}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / scale)
        .collect())
}

/// Write a buffer as a 32-bit float WAV file.
pub fn save_wav(path: impl AsRef<Path>, buffer: &AudioBuffer) -> DatasetResult<()> {
    let path = path.as_ref();
    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate as u32,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| DatasetError::Audio(format!("Failed to create WAV: {}", e)))?;

    for frame in 0..buffer.num_samples() {
        for ch in buffer.channels() {
            writer
                .write_sample(ch[frame])
                .map_err(|e| DatasetError::Audio(format!("Failed to write sample: {}", e)))?;
        }
    }

    writer
        .finalize()
        .map_err(|e| DatasetError::Audio(format!("Failed to finalize WAV: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm16_eager_scale() {
        let bytes: Vec<u8> = [32767i16, -32767, 0, 16384]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let samples = pcm16_to_f32(&bytes, EAGER_PCM_SCALE).unwrap();
        assert_eq!(samples, vec![1.0, -1.0, 0.0, 16384.0 / 32767.0]);
    }

    #[test]
    fn test_pcm16_odd_length() {
        assert!(matches!(
            pcm16_to_f32(&[0, 1, 2], DECODER_PCM_SCALE),
            Err(DatasetError::Decode(_))
        ));
    }

    #[test]
    fn test_save_wav_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("window.wav");
        let buffer =
            AudioBuffer::new(vec![vec![0.5, -0.5, 0.25], vec![0.0, 0.1, 0.2]], 24000).unwrap();
        save_wav(&path, &buffer).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 24000);
        let samples: Vec<f32> = reader.into_samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0.5, 0.0, -0.5, 0.1, 0.25, 0.2]);
    }
}
