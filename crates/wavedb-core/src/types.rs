//! Общие типы для операций с датасетом.
//!
//! Содержит многоканальный буфер сигнала, которым обмениваются экстрактор
//! окон, аугментации и фасад датасета.

use crate::error::{DatasetError, DatasetResult};

// ---------------------------------------------------------------------------
// Аудио-буфер
// ---------------------------------------------------------------------------

/// Многоканальный буфер сигнала формы `(channels, samples)`.
///
/// Каналы хранятся раздельно (planar); все каналы всегда одной длины.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,

    /// Частота дискретизации в Гц.
    pub sample_rate: usize,
}

impl AudioBuffer {
    /// Создать буфер из набора каналов.
    ///
    /// # Ошибки
    /// `DatasetError::Shape`, если каналов нет или их длины различаются.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: usize) -> DatasetResult<Self> {
        let Some(first) = channels.first() else {
            return Err(DatasetError::Shape("buffer must have at least one channel".into()));
        };
        let len = first.len();
        if let Some(bad) = channels.iter().position(|c| c.len() != len) {
            return Err(DatasetError::Shape(format!(
                "channel {bad} has {} samples, expected {len}",
                channels[bad].len()
            )));
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Моно-буфер.
    pub fn mono(samples: Vec<f32>, sample_rate: usize) -> Self {
        Self {
            channels: vec![samples],
            sample_rate,
        }
    }

    /// Тишина заданной формы.
    pub fn zeros(num_channels: usize, num_samples: usize, sample_rate: usize) -> Self {
        Self {
            channels: vec![vec![0.0; num_samples]; num_channels.max(1)],
            sample_rate,
        }
    }

    /// Разбить плоский буфер, упорядоченный по каналам, на `num_channels` частей.
    ///
    /// Аналог `reshape(num_channels, -1)`.
    pub fn from_planar(
        samples: Vec<f32>,
        num_channels: usize,
        sample_rate: usize,
    ) -> DatasetResult<Self> {
        if num_channels == 0 || samples.len() % num_channels != 0 {
            return Err(DatasetError::Shape(format!(
                "cannot reshape {} samples into {} channels",
                samples.len(),
                num_channels
            )));
        }
        let per_channel = samples.len() / num_channels;
        if per_channel == 0 {
            return Ok(Self::zeros(num_channels, 0, sample_rate));
        }
        let channels = samples
            .chunks_exact(per_channel)
            .map(<[f32]>::to_vec)
            .collect();
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Количество каналов.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Количество сэмплов на канал.
    pub fn num_samples(&self) -> usize {
        self.channels[0].len()
    }

    /// Форма `(channels, samples)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_channels(), self.num_samples())
    }

    /// Длительность в секундах.
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_samples() as f32 / self.sample_rate as f32
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Максимальная абсолютная амплитуда по всем каналам.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flatten()
            .fold(0.0_f32, |acc, v| acc.max(v.abs()))
    }

    /// Применить функцию к каждому сэмплу.
    pub fn map_samples(mut self, f: impl Fn(f32) -> f32) -> Self {
        for v in self.channels.iter_mut().flatten() {
            *v = f(*v);
        }
        self
    }

    /// Заменить каждый канал результатом `f`.
    ///
    /// `f` должна возвращать каналы одинаковой длины, иначе `Shape`.
    pub fn map_channels(self, f: impl FnMut(Vec<f32>) -> Vec<f32>) -> DatasetResult<Self> {
        let sample_rate = self.sample_rate;
        let channels = self.channels.into_iter().map(f).collect();
        Self::new(channels, sample_rate)
    }

    /// Умножить все сэмплы на `gain`.
    pub fn scale(self, gain: f32) -> Self {
        self.map_samples(|v| v * gain)
    }

    /// Взять отрезок `[start, start + len)` в каждом канале.
    pub fn slice(&self, start: usize, len: usize) -> DatasetResult<Self> {
        if start + len > self.num_samples() {
            return Err(DatasetError::Shape(format!(
                "slice {}..{} exceeds {} samples",
                start,
                start + len,
                self.num_samples()
            )));
        }
        Ok(Self {
            channels: self
                .channels
                .iter()
                .map(|c| c[start..start + len].to_vec())
                .collect(),
            sample_rate: self.sample_rate,
        })
    }

    /// Каналы как вложенные векторы.
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Плоский вектор, упорядоченный по каналам.
    pub fn into_planar(self) -> Vec<f32> {
        self.channels.into_iter().flatten().collect()
    }
}
