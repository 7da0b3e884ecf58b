//! # wavedb-core
//!
//! Базовые типы, трейты и определения ошибок для движка аудио-датасетов wavedb.
//!
//! Этот крейт предоставляет фундаментальные абстракции для всех остальных
//! крейтов в workspace:
//!
//! - Многоканальный буфер сигнала [`AudioBuffer`]
//! - Конфигурация датасета и аугментаций ([`DatasetMetadata`], [`AugmentConfig`], [`DatasetOptions`])
//! - Унифицированная обработка ошибок через [`DatasetError`]
//! - Trait [`AudioDataset`] - единый интерфейс для всех вариантов датасета
//! - Trait [`Decoder`] - внешний декодер аудиофайлов для ленивого режима

pub mod config;
pub mod debug;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{AugmentConfig, DatasetMetadata, DatasetOptions, resolve_channels};
pub use error::{DatasetError, DatasetResult};
pub use traits::{AudioDataset, DecodeRequest, Decoder};
pub use types::AudioBuffer;
