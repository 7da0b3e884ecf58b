#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use heed::types::Bytes;
use heed::{Database, EnvOpenOptions};
use wavedb::AudioRecord;
use wavedb_core::{DatasetMetadata, DatasetResult, DecodeRequest, Decoder};

/// Write `records` into a fresh LMDB environment at `dir`, plus `metadata.yaml`.
pub fn write_dataset(dir: &Path, metadata: &DatasetMetadata, records: &[(&str, AudioRecord)]) {
    let env = unsafe {
        EnvOpenOptions::new()
            .map_size(64 * 1024 * 1024)
            .open(dir)
            .unwrap()
    };
    let mut wtxn = env.write_txn().unwrap();
    let db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, None).unwrap();
    for (key, record) in records {
        db.put(&mut wtxn, key.as_bytes(), &record.encode()).unwrap();
    }
    wtxn.commit().unwrap();
    env.prepare_for_closing().wait();

    let yaml = serde_yaml::to_string(metadata).unwrap();
    std::fs::write(dir.join("metadata.yaml"), yaml).unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub path: PathBuf,
    pub sample_rate: usize,
    pub start_secs: f64,
    pub duration_secs: f64,
    pub channel: usize,
}

/// Decoder returning a constant signal of the requested duration and
/// remembering every request.
pub struct RecordingDecoder {
    pub value: i16,
    pub calls: Mutex<Vec<Call>>,
}

impl RecordingDecoder {
    pub fn new(value: i16) -> Self {
        Self {
            value,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Decoder for RecordingDecoder {
    fn decode(&self, request: &DecodeRequest<'_>) -> DatasetResult<Vec<u8>> {
        self.calls.lock().unwrap().push(Call {
            path: request.path.to_path_buf(),
            sample_rate: request.sample_rate,
            start_secs: request.start_secs,
            duration_secs: request.duration_secs,
            channel: request.channel,
        });
        let n = (request.duration_secs * request.sample_rate as f64).round() as usize;
        Ok(std::iter::repeat(self.value)
            .take(n)
            .flat_map(|s| s.to_le_bytes())
            .collect())
    }
}

pub fn lazy_record(length: &str, channels: &str, path: &str) -> AudioRecord {
    AudioRecord::from_metadata([("length", length), ("channels", channels), ("path", path)])
}
