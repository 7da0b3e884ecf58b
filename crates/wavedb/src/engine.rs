//! Dataset facade.
//!
//! `DatasetEngine` is the single entry point: it reads the dataset metadata,
//! picks the eager, lazy or remote variant, and builds the augmentation
//! pipeline.

use std::path::Path;
use std::sync::Arc;

use augment::{Pipeline, Transform};
use serde::Serialize;
use tracing::info;
use wavedb_core::{
    resolve_channels, AudioBuffer, AudioDataset, DatasetMetadata, DatasetOptions, DatasetResult,
    Decoder,
};

use crate::dataset::{EagerDataset, LazyDataset};
use crate::extract::FfmpegDecoder;
use crate::remote::RemoteDataset;
use crate::split::{split_indices, Subset};
use crate::store::LmdbStore;

/// Dataset variant behind the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Eager,
    Lazy,
    Remote,
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetKind::Eager => write!(f, "eager"),
            DatasetKind::Lazy => write!(f, "lazy"),
            DatasetKind::Remote => write!(f, "remote"),
        }
    }
}

/// Summary of an opened dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetInfo {
    pub kind: DatasetKind,
    pub len: usize,
    pub channels: usize,
    /// Rate windows are extracted at.
    pub dataset_sample_rate: usize,
    /// Rate windows are delivered at.
    pub sample_rate: usize,
    pub n_signal: usize,
    /// Augmentation stages in execution order.
    pub stages: Vec<String>,
}

/// Единый движок датасета, абстрагирующий конкретный вариант.
///
/// Под капотом хранит `Arc<dyn AudioDataset>` и делегирует вызовы.
pub struct DatasetEngine {
    inner: Arc<dyn AudioDataset>,
    info: DatasetInfo,
    options: DatasetOptions,
}

impl DatasetEngine {
    /// Открыть датасет по пути к LMDB-директории или по URL сервиса.
    ///
    /// Пути, начинающиеся с `http`, открываются как [`RemoteDataset`].
    /// Ленивые датасеты декодируются через [`FfmpegDecoder::from_env`].
    ///
    /// # Ошибки
    /// Возвращает ошибку, если:
    /// - `metadata.yaml` отсутствует или не читается;
    /// - запрошено больше каналов, чем есть в датасете;
    /// - конфигурация аугментаций некорректна;
    /// - хранилище или удалённый сервис недоступны.
    pub fn open(path: impl AsRef<Path>, options: &DatasetOptions) -> DatasetResult<Self> {
        Self::open_with(path, options, Arc::new(FfmpegDecoder::from_env()), Vec::new())
    }

    /// Открыть датасет с заданным декодером.
    pub fn open_with_decoder(
        path: impl AsRef<Path>,
        options: &DatasetOptions,
        decoder: Arc<dyn Decoder>,
    ) -> DatasetResult<Self> {
        Self::open_with(path, options, decoder, Vec::new())
    }

    /// Открыть датасет с декодером и дополнительными аугментациями.
    ///
    /// `extra` выполняются после всех встроенных стадий, в заданном порядке.
    pub fn open_with(
        path: impl AsRef<Path>,
        options: &DatasetOptions,
        decoder: Arc<dyn Decoder>,
        extra: Vec<Box<dyn Transform>>,
    ) -> DatasetResult<Self> {
        let path = path.as_ref();
        let config = &options.augment;
        config.validate()?;

        let location = path.to_string_lossy();
        if location.starts_with("http") {
            let channels = resolve_channels(options.channels, None)?;
            let remote = RemoteDataset::connect(location.as_ref(), channels, config.sample_rate)?;
            let info = DatasetInfo {
                kind: DatasetKind::Remote,
                len: remote.len(),
                channels,
                dataset_sample_rate: config.sample_rate,
                sample_rate: config.sample_rate,
                n_signal: config.n_signal,
                stages: Vec::new(),
            };
            return Ok(Self::finish(Arc::new(remote), info, options));
        }

        let metadata = DatasetMetadata::load(path)?;
        let channels = resolve_channels(options.channels, metadata.channels)?;
        let dataset_sr = metadata.sample_rate_or(config.sample_rate);
        info!(sr = config.sample_rate, sr_dataset = dataset_sr, "sample rates");

        let pipeline = Pipeline::build(config, dataset_sr, extra)?;
        let stages = pipeline.stage_names().into_iter().map(String::from).collect();
        let store = Box::new(LmdbStore::open(path));

        let (inner, kind): (Arc<dyn AudioDataset>, _) = if metadata.lazy {
            let dataset = LazyDataset::new(store, decoder, dataset_sr, config.n_signal, channels)?
                .with_pipeline(pipeline);
            (Arc::new(dataset), DatasetKind::Lazy)
        } else {
            let dataset = EagerDataset::new(store, options.audio_key.clone(), channels, dataset_sr)?
                .with_pipeline(pipeline);
            (Arc::new(dataset), DatasetKind::Eager)
        };

        let info = DatasetInfo {
            kind,
            len: inner.len(),
            channels,
            dataset_sample_rate: dataset_sr,
            sample_rate: config.sample_rate,
            n_signal: config.n_signal,
            stages,
        };
        Ok(Self::finish(inner, info, options))
    }

    fn finish(inner: Arc<dyn AudioDataset>, info: DatasetInfo, options: &DatasetOptions) -> Self {
        info!(
            "DatasetEngine: {} датасет, {} окон, {} кан.",
            info.kind, info.len, info.channels
        );
        Self {
            inner,
            info,
            options: options.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Делегация AudioDataset
    // -----------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Окно с индексом `index`, уже прошедшее через аугментации.
    pub fn get(&self, index: usize) -> DatasetResult<AudioBuffer> {
        self.inner.get(index)
    }

    pub fn kind(&self) -> DatasetKind {
        self.info.kind
    }

    pub fn info(&self) -> &DatasetInfo {
        &self.info
    }

    pub fn options(&self) -> &DatasetOptions {
        &self.options
    }

    /// Общий доступ к внутреннему датасету.
    pub fn dataset(&self) -> Arc<dyn AudioDataset> {
        Arc::clone(&self.inner)
    }

    /// Детерминированное разбиение на обучающую и валидационную части.
    pub fn split(&self, percent: usize, residual_cap: Option<usize>) -> (Subset, Subset) {
        let split = split_indices(self.len(), percent, residual_cap);
        (
            Subset::new(self.dataset(), split.train),
            Subset::new(self.dataset(), split.val),
        )
    }
}

impl AudioDataset for DatasetEngine {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, index: usize) -> DatasetResult<AudioBuffer> {
        self.inner.get(index)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
