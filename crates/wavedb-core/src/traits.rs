//! Унифицированные trait'ы движка.
//!
//! [`AudioDataset`] - единый интерфейс последовательности окон с произвольным
//! доступом (eager, lazy, remote). [`Decoder`] - внешняя служба декодирования,
//! которую ленивый режим вызывает для каждого окна.

use std::path::Path;

use crate::error::DatasetResult;
use crate::types::AudioBuffer;

/// Датасет окон сигнала с произвольным доступом.
///
/// Реализации должны быть `Send + Sync`, чтобы один экземпляр можно было
/// читать из нескольких потоков загрузчика.
///
/// # Пример
/// ```ignore
/// let engine = DatasetEngine::open("data/guitar", &DatasetOptions::default())?;
/// let window = engine.get(0)?;
/// assert_eq!(window.num_samples(), engine.options().augment.n_signal);
/// ```
pub trait AudioDataset: Send + Sync {
    /// Количество доступных окон.
    fn len(&self) -> usize;

    /// Пустой ли датасет.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Окно с индексом `index` (нумерация с нуля).
    ///
    /// # Ошибки
    /// `DatasetError::Index`, если `index >= len()`; ошибки хранилища,
    /// декодирования и аугментаций пробрасываются как есть.
    fn get(&self, index: usize) -> DatasetResult<AudioBuffer>;

    /// Человекочитаемое имя варианта датасета.
    fn name(&self) -> &str {
        "dataset"
    }
}

/// Параметры одного вызова внешнего декодера.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeRequest<'a> {
    /// Исходный файл.
    pub path: &'a Path,
    /// Частота дискретизации результата.
    pub sample_rate: usize,
    /// Начало отрезка в секундах.
    pub start_secs: f64,
    /// Длительность отрезка в секундах.
    pub duration_secs: f64,
    /// Канал исходного файла, который попадёт в моно-выход.
    pub channel: usize,
}

/// Декодер произвольного аудиофайла в 16-bit PCM.
///
/// Возвращает сырые little-endian `i16` байты одного канала. Пустой результат
/// считается ошибкой на стороне вызывающего кода.
pub trait Decoder: Send + Sync {
    fn decode(&self, request: &DecodeRequest<'_>) -> DatasetResult<Vec<u8>>;
}
