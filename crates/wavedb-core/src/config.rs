//! Конфигурационные структуры датасета и аугментаций.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DatasetError, DatasetResult};

/// Имя файла метаданных в корне датасета.
pub const METADATA_FILE: &str = "metadata.yaml";

/// Метаданные датасета (`metadata.yaml`), записанные при препроцессинге.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Записи ссылаются на исходные файлы и декодируются по требованию.
    #[serde(default)]
    pub lazy: bool,

    /// Количество каналов исходного материала.
    #[serde(default)]
    pub channels: Option<usize>,

    /// Частота дискретизации датасета. Старый препроцессинг её не пишет.
    #[serde(default)]
    pub sr: Option<usize>,
}

impl DatasetMetadata {
    /// Прочитать `metadata.yaml` из директории датасета.
    pub fn load(db_path: impl AsRef<Path>) -> DatasetResult<Self> {
        let path = db_path.as_ref().join(METADATA_FILE);
        let text = std::fs::read_to_string(&path).map_err(|e| {
            DatasetError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Частота дискретизации датасета; при отсутствии берётся `target`.
    pub fn sample_rate_or(&self, target: usize) -> usize {
        match self.sr {
            Some(sr) => sr,
            None => {
                warn!("sr не задан в метаданных датасета (старый препроцессинг), считаем {target}");
                target
            }
        }
    }
}

/// Определить количество каналов для обучения.
///
/// - запрошено больше, чем есть в датасете → `Config`;
/// - не запрошено → берётся из метаданных;
/// - нигде не задано → 1 с предупреждением.
pub fn resolve_channels(
    requested: Option<usize>,
    declared: Option<usize>,
) -> DatasetResult<usize> {
    if let (Some(req), Some(decl)) = (requested, declared) {
        if req > decl {
            return Err(DatasetError::Config(format!(
                "requested {req} channels, but dataset has {decl} channels"
            )));
        }
    }
    match requested.or(declared) {
        Some(0) => Err(DatasetError::Config("channel count must be > 0".into())),
        Some(n) => Ok(n),
        None => {
            warn!("channels не найден в метаданных датасета, используем 1");
            Ok(1)
        }
    }
}

/// Конфигурация цепочки аугментаций.
///
/// Каждая необязательная стадия включается ненулевым значением своего
/// параметра. Порядок стадий фиксирован, см. `augment::Pipeline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// Целевая частота дискретизации в Гц.
    pub sample_rate: usize,

    /// Длина итогового окна в сэмплах.
    pub n_signal: usize,

    /// Обучение на производной сигнала.
    pub derivative: bool,

    /// Пиковая нормализация.
    pub normalize: bool,

    /// Максимальный сдвиг скорости в полутонах (0 - выключено).
    pub speed_semitones: f32,

    /// Диапазон случайного усиления в дБ (0 - выключено).
    pub gain_db: f32,

    /// Вероятность allpass-фильтра (фазовые искажения).
    pub allpass_p: f64,

    /// Вероятность случайного эквалайзера.
    pub eq_p: f64,

    /// Вероятность гребенчатой задержки.
    pub delay_p: f64,

    /// Вероятность дисторшна.
    pub distort_p: f64,

    /// Диапазон случайного питча `[min, max]` (коэффициенты частоты).
    pub rand_pitch: Option<[f32; 2]>,

    /// Вероятность применения случайного питча.
    pub pitch_p: f64,

    /// Разрядность исходного PCM для дизеринга.
    pub dequantize_bits: u32,

    /// Максимальная задержка гребенчатого фильтра в сэмплах.
    pub max_delay: usize,

    /// Максимальный драйв дисторшна.
    pub max_drive: f32,

    /// Максимальное усиление при нормализации в дБ.
    pub normalize_max_gain_db: f32,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            n_signal: 131072,
            derivative: false,
            normalize: false,
            speed_semitones: 0.0,
            gain_db: 0.0,
            allpass_p: 0.8,
            eq_p: 0.0,
            delay_p: 0.0,
            distort_p: 0.0,
            rand_pitch: None,
            pitch_p: 0.5,
            dequantize_bits: 16,
            max_delay: 1024,
            max_drive: 32.0,
            normalize_max_gain_db: 30.0,
        }
    }
}

impl AugmentConfig {
    /// Конфигурация без аугментаций: только кроп и дизеринг.
    pub fn plain(sample_rate: usize, n_signal: usize) -> Self {
        Self {
            sample_rate,
            n_signal,
            allpass_p: 0.0,
            ..Self::default()
        }
    }

    /// Проверить согласованность параметров.
    pub fn validate(&self) -> DatasetResult<()> {
        if self.sample_rate == 0 {
            return Err(DatasetError::Config("sample_rate must be > 0".into()));
        }
        if self.n_signal == 0 {
            return Err(DatasetError::Config("n_signal must be > 0".into()));
        }
        for (name, p) in [
            ("allpass_p", self.allpass_p),
            ("eq_p", self.eq_p),
            ("delay_p", self.delay_p),
            ("distort_p", self.distort_p),
            ("pitch_p", self.pitch_p),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(DatasetError::Config(format!(
                    "{name} must be a probability in [0, 1], got {p}"
                )));
            }
        }
        if !(self.speed_semitones >= 0.0 && self.speed_semitones.is_finite()) {
            return Err(DatasetError::Config(format!(
                "speed_semitones must be >= 0, got {}",
                self.speed_semitones
            )));
        }
        if !(self.gain_db >= 0.0 && self.gain_db.is_finite()) {
            return Err(DatasetError::Config(format!(
                "gain_db must be >= 0, got {}",
                self.gain_db
            )));
        }
        if let Some([lo, hi]) = self.rand_pitch {
            if !(lo > 0.0 && lo < hi) {
                return Err(DatasetError::Config(format!(
                    "rand_pitch must be an increasing positive range, got [{lo}, {hi}]"
                )));
            }
        }
        if !(1..=32).contains(&self.dequantize_bits) {
            return Err(DatasetError::Config(format!(
                "dequantize_bits must be in 1..=32, got {}",
                self.dequantize_bits
            )));
        }
        if self.delay_p > 0.0 && self.max_delay < 2 {
            return Err(DatasetError::Config("max_delay must be >= 2".into()));
        }
        if self.max_drive < 0.25 {
            return Err(DatasetError::Config("max_drive must be >= 0.25".into()));
        }
        Ok(())
    }
}

/// Параметры открытия датасета.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetOptions {
    /// Требуемое количество каналов. `None` - как в датасете.
    pub channels: Option<usize>,

    /// Имя буфера с аудио в eager-записях.
    pub audio_key: String,

    /// Цепочка аугментаций.
    pub augment: AugmentConfig,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            channels: None,
            audio_key: "waveform".to_string(),
            augment: AugmentConfig::default(),
        }
    }
}

impl DatasetOptions {
    pub fn new(augment: AugmentConfig) -> Self {
        Self {
            augment,
            ..Self::default()
        }
    }

    /// Установить требуемое количество каналов.
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Загрузить параметры из YAML-файла.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> DatasetResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let options: Self = serde_yaml::from_str(&text)?;
        options.augment.validate()?;
        Ok(options)
    }
}
