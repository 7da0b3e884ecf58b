//! Local dataset variants: eager (pre-extracted buffers) and lazy (decoded on
//! demand through the cumulative index).

use std::path::Path;
use std::sync::Arc;

use augment::Pipeline;
use tracing::{debug, info};
use wavedb_core::{AudioBuffer, AudioDataset, DatasetError, DatasetResult, Decoder};

use crate::extract::{extract_eager, extract_lazy, LazyWindow};
use crate::index::CumulativeIndex;
use crate::store::RecordStore;

fn apply(pipeline: Option<&Pipeline>, buffer: AudioBuffer) -> DatasetResult<AudioBuffer> {
    match pipeline {
        Some(pipeline) => pipeline.process(buffer),
        None => Ok(buffer),
    }
}

/// One window per record, read from a pre-extracted int16 buffer.
pub struct EagerDataset {
    store: Box<dyn RecordStore>,
    audio_key: String,
    channels: usize,
    sample_rate: usize,
    len: usize,
    pipeline: Option<Pipeline>,
}

impl EagerDataset {
    /// Enumerate the store keys and wrap the store.
    pub fn new(
        store: Box<dyn RecordStore>,
        audio_key: impl Into<String>,
        channels: usize,
        sample_rate: usize,
    ) -> DatasetResult<Self> {
        if channels == 0 {
            return Err(DatasetError::Config("channel count must be > 0".into()));
        }
        let len = store.len()?;
        let audio_key = audio_key.into();
        info!(records = len, channels, audio_key = %audio_key, "eager dataset ready");
        Ok(Self {
            store,
            audio_key,
            channels,
            sample_rate,
            len,
            pipeline: None,
        })
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn pipeline(&self) -> Option<&Pipeline> {
        self.pipeline.as_ref()
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> usize {
        self.sample_rate
    }

    /// Window before augmentation.
    pub fn raw(&self, index: usize) -> DatasetResult<AudioBuffer> {
        if index >= self.len {
            return Err(DatasetError::Index {
                index,
                len: self.len,
            });
        }
        let record = self.store.get_at(index)?;
        extract_eager(&record, &self.audio_key, self.channels, self.sample_rate)
    }
}

impl AudioDataset for EagerDataset {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, index: usize) -> DatasetResult<AudioBuffer> {
        let buffer = self.raw(index)?;
        apply(self.pipeline.as_ref(), buffer)
    }

    fn name(&self) -> &str {
        "eager"
    }
}

/// Windows of `2 * n_signal` samples decoded from source files.
pub struct LazyDataset {
    store: Box<dyn RecordStore>,
    decoder: Arc<dyn Decoder>,
    index: CumulativeIndex,
    sample_rate: usize,
    n_signal: usize,
    channels: usize,
    pipeline: Option<Pipeline>,
}

impl LazyDataset {
    /// Build the cumulative index over every record of `store`.
    pub fn new(
        store: Box<dyn RecordStore>,
        decoder: Arc<dyn Decoder>,
        sample_rate: usize,
        n_signal: usize,
        channels: usize,
    ) -> DatasetResult<Self> {
        if channels == 0 {
            return Err(DatasetError::Config("channel count must be > 0".into()));
        }
        let index = CumulativeIndex::build(store.as_ref(), sample_rate, n_signal)?;
        info!(
            records = index.bounds().len(),
            windows = index.total(),
            sample_rate,
            n_signal,
            channels,
            "lazy dataset indexed"
        );
        Ok(Self {
            store,
            decoder,
            index,
            sample_rate,
            n_signal,
            channels,
            pipeline: None,
        })
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn pipeline(&self) -> Option<&Pipeline> {
        self.pipeline.as_ref()
    }

    pub fn index(&self) -> &CumulativeIndex {
        &self.index
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> usize {
        self.sample_rate
    }

    pub fn n_signal(&self) -> usize {
        self.n_signal
    }

    /// Rebuild the index for a new extraction rate or window length.
    pub fn reindex(&mut self, sample_rate: usize, n_signal: usize) -> DatasetResult<()> {
        let index = CumulativeIndex::build(self.store.as_ref(), sample_rate, n_signal)?;
        info!(
            windows = index.total(),
            sample_rate, n_signal, "lazy dataset reindexed"
        );
        self.index = index;
        self.sample_rate = sample_rate;
        self.n_signal = n_signal;
        Ok(())
    }

    /// Window before augmentation.
    pub fn raw(&self, index: usize) -> DatasetResult<AudioBuffer> {
        let location = self.index.resolve(index)?;
        let record = self.store.get_at(location.record)?;
        let path = record.path()?;
        let source_channels = record.channels()?;
        debug!(
            index,
            record = location.record,
            offset = location.sample_offset,
            path,
            "extracting lazy window"
        );
        extract_lazy(
            self.decoder.as_ref(),
            &LazyWindow {
                path: Path::new(path),
                n_signal: self.n_signal,
                sample_rate: self.sample_rate,
                start_sample: location.sample_offset,
                source_channels,
                target_channels: self.channels,
            },
        )
    }
}

impl AudioDataset for LazyDataset {
    fn len(&self) -> usize {
        self.index.total()
    }

    fn get(&self, index: usize) -> DatasetResult<AudioBuffer> {
        let buffer = self.raw(index)?;
        apply(self.pipeline.as_ref(), buffer)
    }

    fn name(&self) -> &str {
        "lazy"
    }
}
