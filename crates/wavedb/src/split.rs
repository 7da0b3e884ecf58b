//! Deterministic train/validation split.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;
use wavedb_core::{AudioBuffer, AudioDataset, DatasetError, DatasetResult};

/// Seed of the split permutation.
pub const SPLIT_SEED: u64 = 42;

/// Disjoint, exhaustive partition of `0..total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub val: Vec<usize>,
}

/// Split `0..total` into train and validation indices.
///
/// The validation side gets `max(total * percent / 100, 1)` indices, capped
/// by `residual_cap` and by `total`. The permutation is seeded, so the same
/// `total` always gives the same partition.
pub fn split_indices(total: usize, percent: usize, residual_cap: Option<usize>) -> SplitIndices {
    let mut val_count = (total * percent / 100).max(1);
    if let Some(cap) = residual_cap {
        val_count = val_count.min(cap);
    }
    let val_count = val_count.min(total);
    let train_count = total - val_count;

    let mut indices: Vec<usize> = (0..total).collect();
    let mut rng = StdRng::seed_from_u64(SPLIT_SEED);
    indices.shuffle(&mut rng);
    let val = indices.split_off(train_count);

    info!("train set: {train_count} examples");
    info!("val set: {val_count} examples");
    SplitIndices {
        train: indices,
        val,
    }
}

/// View of a dataset restricted to a list of indices.
#[derive(Clone)]
pub struct Subset {
    inner: Arc<dyn AudioDataset>,
    indices: Vec<usize>,
}

impl Subset {
    pub fn new(inner: Arc<dyn AudioDataset>, indices: Vec<usize>) -> Self {
        Self { inner, indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl std::fmt::Debug for Subset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subset")
            .field("inner", &self.inner.name())
            .field("len", &self.indices.len())
            .finish()
    }
}

impl AudioDataset for Subset {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, index: usize) -> DatasetResult<AudioBuffer> {
        let inner = *self.indices.get(index).ok_or(DatasetError::Index {
            index,
            len: self.indices.len(),
        })?;
        self.inner.get(inner)
    }

    fn name(&self) -> &str {
        "subset"
    }
}
