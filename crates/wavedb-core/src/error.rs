//! Error types for wavedb.

use thiserror::Error;

/// Main error type for dataset operations.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Key is missing from the record store.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Malformed record or unsupported sample precision.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Channel/length mismatch for a buffer-shape precondition.
    #[error("Shape error: {0}")]
    Shape(String),

    /// External decoder failed or produced no data.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Flat index outside `[0, len)`.
    #[error("Index {index} out of range for dataset of length {len}")]
    Index { index: usize, len: usize },

    /// Configuration inconsistent with dataset metadata.
    #[error("Config error: {0}")]
    Config(String),

    /// Signal processing errors (resampler setup, etc.).
    #[error("Audio error: {0}")]
    Audio(String),

    /// Unexpected answer from the remote dataset service.
    #[error("Remote error: {0}")]
    Remote(String),

    /// HTTP transport errors.
    #[error("HTTP error: {0}")]
    Http(String),

    /// I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// LMDB errors.
    #[error("Store error: {0}")]
    Store(#[from] heed::Error),
}

impl DatasetError {
    /// `true` for failures that make the whole dataset unusable.
    ///
    /// Per-sample failures (one corrupt record, one failed decode) return
    /// `false`; the caller may skip that sample and keep going.
    pub fn is_systemic(&self) -> bool {
        !matches!(
            self,
            DatasetError::Extraction(_)
                | DatasetError::Decode(_)
                | DatasetError::Shape(_)
                | DatasetError::Audio(_)
        )
    }
}

/// Result type alias for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_systemic_classification() {
        assert!(!DatasetError::Extraction("ffmpeg exited with 1".into()).is_systemic());
        assert!(!DatasetError::Decode("precision INT8".into()).is_systemic());
        assert!(DatasetError::Config("channels".into()).is_systemic());
        assert!(DatasetError::Index { index: 3, len: 3 }.is_systemic());
    }

    #[test]
    fn test_index_message() {
        let err = DatasetError::Index { index: 10, len: 4 };
        assert_eq!(err.to_string(), "Index 10 out of range for dataset of length 4");
    }
}
