//! Structured audio record codec.
//!
//! Store values are protobuf `AudioExample` messages written by the
//! preprocessing stage: named sample buffers plus string metadata.

use std::collections::HashMap;

use prost::Message;
use wavedb_core::{DatasetError, DatasetResult};

/// Sample precision of a stored buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Precision {
    Int8 = 0,
    Int16 = 1,
    Int32 = 2,
    Int64 = 3,
    Float16 = 4,
    Float32 = 5,
    Float64 = 6,
}

/// One named sample buffer.
#[derive(Clone, PartialEq, Message)]
pub struct AudioBufferProto {
    #[prost(int32, tag = "1")]
    pub sampling_rate: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
    #[prost(enumeration = "Precision", tag = "3")]
    pub precision: i32,
    #[prost(int32, repeated, tag = "4")]
    pub shape: Vec<i32>,
}

/// Wire form of a record.
#[derive(Clone, PartialEq, Message)]
pub struct AudioExample {
    #[prost(map = "string, message", tag = "1")]
    pub buffers: HashMap<String, AudioBufferProto>,
    #[prost(map = "string, string", tag = "2")]
    pub metadata: HashMap<String, String>,
}

/// A decoded store record.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioRecord {
    example: AudioExample,
}

impl AudioRecord {
    /// Parse a store value.
    pub fn decode(bytes: &[u8]) -> DatasetResult<Self> {
        let example = AudioExample::decode(bytes)
            .map_err(|e| DatasetError::Decode(format!("malformed AudioExample: {e}")))?;
        Ok(Self { example })
    }

    pub fn encode(&self) -> Vec<u8> {
        self.example.encode_to_vec()
    }

    /// Record holding only metadata (the lazy layout).
    pub fn from_metadata<K, V>(metadata: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            example: AudioExample {
                buffers: HashMap::new(),
                metadata: metadata
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            },
        }
    }

    /// Attach an int16 buffer under `name`.
    pub fn with_pcm16(mut self, name: impl Into<String>, samples: &[i16], sampling_rate: i32) -> Self {
        let data = samples.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.example.buffers.insert(
            name.into(),
            AudioBufferProto {
                sampling_rate,
                data,
                precision: Precision::Int16 as i32,
                shape: vec![samples.len() as i32],
            },
        );
        self
    }

    /// Raw bytes of an int16 buffer.
    ///
    /// # Ошибки
    /// `Decode`, если буфера нет или его точность не INT16.
    pub fn pcm16(&self, name: &str) -> DatasetResult<&[u8]> {
        let buffer = self
            .example
            .buffers
            .get(name)
            .ok_or_else(|| DatasetError::Decode(format!("record has no buffer '{name}'")))?;
        match Precision::try_from(buffer.precision).ok() {
            Some(Precision::Int16) => Ok(&buffer.data),
            other => Err(DatasetError::Decode(format!(
                "buffer '{name}' has precision {other:?} (raw {}), only INT16 is supported",
                buffer.precision
            ))),
        }
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.example.metadata
    }

    /// Raw metadata value.
    pub fn meta(&self, key: &str) -> DatasetResult<&str> {
        self.example
            .metadata
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| DatasetError::Decode(format!("record metadata has no '{key}'")))
    }

    /// Declared duration in seconds (`length`).
    pub fn length_secs(&self) -> DatasetResult<f64> {
        let raw = self.meta("length")?;
        raw.trim()
            .parse::<f64>()
            .map_err(|_| DatasetError::Decode(format!("length '{raw}' is not a number")))
    }

    /// Source channel count (`channels`).
    pub fn channels(&self) -> DatasetResult<usize> {
        let raw = self.meta("channels")?;
        raw.trim()
            .parse::<usize>()
            .map_err(|_| DatasetError::Decode(format!("channels '{raw}' is not an integer")))
    }

    /// Source file of a lazy record (`path`).
    pub fn path(&self) -> DatasetResult<&str> {
        self.meta("path")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_metadata_and_buffer() {
        let record = AudioRecord::from_metadata([("length", "10.5"), ("channels", "2")])
            .with_pcm16("waveform", &[1, -2, 3], 44100);
        let decoded = AudioRecord::decode(&record.encode()).unwrap();

        assert_eq!(decoded.length_secs().unwrap(), 10.5);
        assert_eq!(decoded.channels().unwrap(), 2);
        assert_eq!(decoded.pcm16("waveform").unwrap(), &[1, 0, 254, 255, 3, 0]);
    }

    #[test]
    fn test_unsupported_precision() {
        let mut example = AudioExample::default();
        example.buffers.insert(
            "waveform".into(),
            AudioBufferProto {
                data: vec![0; 4],
                precision: Precision::Float32 as i32,
                ..Default::default()
            },
        );
        let record = AudioRecord::decode(&example.encode_to_vec()).unwrap();
        assert!(matches!(record.pcm16("waveform"), Err(DatasetError::Decode(_))));
    }

    #[test]
    fn test_missing_metadata() {
        let record = AudioRecord::from_metadata([("path", "/a.flac")]);
        assert_eq!(record.path().unwrap(), "/a.flac");
        assert!(matches!(record.length_secs(), Err(DatasetError::Decode(_))));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        assert!(matches!(
            AudioRecord::decode(&[0xff, 0xff, 0xff]),
            Err(DatasetError::Decode(_))
        ));
    }
}
