//! Cumulative window index of a lazy dataset.

use tracing::debug;
use wavedb_core::{DatasetError, DatasetResult};

use crate::store::RecordStore;

/// Location of one window inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLocation {
    /// Position of the record in store key order.
    pub record: usize,
    /// Window ordinal inside the record.
    pub window: usize,
    /// First sample of the window inside the record.
    pub sample_offset: usize,
}

/// Non-decreasing cumulative window counts, one entry per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeIndex {
    bounds: Vec<usize>,
    n_signal: usize,
}

/// Number of whole windows in a record of `length_secs` seconds.
pub fn window_count(length_secs: f64, sample_rate: usize, n_signal: usize) -> usize {
    if !length_secs.is_finite() || length_secs <= 0.0 || n_signal == 0 {
        return 0;
    }
    let samples = (length_secs * sample_rate as f64).floor() as usize;
    samples / n_signal
}

impl CumulativeIndex {
    /// Index from per-record durations in seconds.
    pub fn from_lengths(lengths: &[f64], sample_rate: usize, n_signal: usize) -> Self {
        let mut total = 0usize;
        let bounds = lengths
            .iter()
            .map(|&length| {
                total += window_count(length, sample_rate, n_signal);
                total
            })
            .collect();
        Self { bounds, n_signal }
    }

    /// Read `length` of every record and accumulate window counts.
    pub fn build(
        store: &dyn RecordStore,
        sample_rate: usize,
        n_signal: usize,
    ) -> DatasetResult<Self> {
        if sample_rate == 0 || n_signal == 0 {
            return Err(DatasetError::Config(format!(
                "cannot index with sample_rate={sample_rate}, n_signal={n_signal}"
            )));
        }
        let keys = store.keys()?;
        let mut lengths = Vec::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            let length = store.get(key)?.length_secs()?;
            debug!(
                record = i,
                of = keys.len(),
                length,
                windows = window_count(length, sample_rate, n_signal),
                "discovering dataset"
            );
            lengths.push(length);
        }
        Ok(Self::from_lengths(&lengths, sample_rate, n_signal))
    }

    /// Total number of windows (the last bound, 0 for an empty store).
    pub fn total(&self) -> usize {
        self.bounds.last().copied().unwrap_or(0)
    }

    pub fn bounds(&self) -> &[usize] {
        &self.bounds
    }

    pub fn n_signal(&self) -> usize {
        self.n_signal
    }

    /// Map a flat window index to its record and sample offset.
    pub fn resolve(&self, index: usize) -> DatasetResult<WindowLocation> {
        let total = self.total();
        if index >= total {
            return Err(DatasetError::Index { index, len: total });
        }
        // first bound strictly greater than index
        let record = self.bounds.partition_point(|&bound| bound <= index);
        let previous = if record == 0 { 0 } else { self.bounds[record - 1] };
        let window = index - previous;
        Ok(WindowLocation {
            record,
            window,
            sample_offset: window * self.n_signal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_count() {
        assert_eq!(window_count(10.0, 24000, 4096), 58);
        assert_eq!(window_count(5.0, 24000, 4096), 29);
        assert_eq!(window_count(0.1, 24000, 4096), 0);
        assert_eq!(window_count(0.0, 24000, 4096), 0);
        assert_eq!(window_count(f64::NAN, 24000, 4096), 0);
    }

    #[test]
    fn test_resolve_boundaries() {
        let index = CumulativeIndex::from_lengths(&[10.0, 5.0], 24000, 4096);
        assert_eq!(index.bounds(), &[58, 87]);
        assert_eq!(index.total(), 87);

        let first = index.resolve(0).unwrap();
        assert_eq!((first.record, first.sample_offset), (0, 0));

        let second = index.resolve(58).unwrap();
        assert_eq!((second.record, second.sample_offset), (1, 0));

        let last = index.resolve(86).unwrap();
        assert_eq!((last.record, last.window, last.sample_offset), (1, 28, 28 * 4096));

        assert!(matches!(
            index.resolve(87),
            Err(DatasetError::Index { index: 87, len: 87 })
        ));
    }

    #[test]
    fn test_short_records_are_unreachable() {
        let index = CumulativeIndex::from_lengths(&[0.0, 0.05, 1.0], 8192, 1024);
        assert_eq!(index.bounds(), &[0, 0, 8]);
        let location = index.resolve(0).unwrap();
        assert_eq!(location.record, 2);
        assert!(index.bounds().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_empty_index() {
        let index = CumulativeIndex::from_lengths(&[], 44100, 2048);
        assert_eq!(index.total(), 0);
        assert!(index.resolve(0).is_err());
    }
}
