//! # wavedb
//!
//! Датасеты окон сигнала поверх LMDB-хранилища аудиозаписей.
//!
//! [`DatasetEngine`] открывает датасет по пути и выбирает вариант:
//!
//! - [`EagerDataset`] - записи уже содержат int16-буфер целиком;
//! - [`LazyDataset`] - записи ссылаются на исходные файлы, окна декодируются
//!   по требованию через [`wavedb_core::Decoder`];
//! - [`RemoteDataset`] - записи приходят от HTTP-сервиса.
//!
//! # Пример
//!
//! ```ignore
//! use wavedb::DatasetEngine;
//! use wavedb_core::DatasetOptions;
//!
//! let engine = DatasetEngine::open("data/guitar", &DatasetOptions::default().with_channels(2))?;
//! let (train, val) = engine.split(2, Some(1000));
//! let window = engine.get(0)?;
//! ```

pub mod dataset;
pub mod engine;
pub mod extract;
pub mod index;
pub mod record;
pub mod remote;
pub mod split;
pub mod store;

pub use dataset::{EagerDataset, LazyDataset};
pub use engine::{DatasetEngine, DatasetInfo, DatasetKind};
pub use extract::{channel_map, extract_eager, extract_lazy, FfmpegDecoder, LazyWindow};
pub use index::{CumulativeIndex, WindowLocation};
pub use record::{AudioRecord, Precision};
pub use remote::RemoteDataset;
pub use split::{split_indices, SplitIndices, Subset};
pub use store::{LmdbStore, MemoryStore, RecordStore};
