//! Read-only record stores.
//!
//! [`LmdbStore`] reads the LMDB database written by the preprocessing stage;
//! [`MemoryStore`] keeps encoded records in memory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use heed::types::Bytes;
use heed::{Database, Env, EnvFlags, EnvOpenOptions};
use tracing::{debug, info};
use wavedb_core::{DatasetError, DatasetResult};

use crate::record::AudioRecord;

/// Ordered, read-only key-value store of audio records.
pub trait RecordStore: Send + Sync {
    /// All keys in store order. Enumerated once, then cached.
    fn keys(&self) -> DatasetResult<&[Vec<u8>]>;

    /// Fetch and decode the record stored under `key`.
    fn get(&self, key: &[u8]) -> DatasetResult<AudioRecord>;

    /// Number of records.
    fn len(&self) -> DatasetResult<usize> {
        Ok(self.keys()?.len())
    }

    /// Record at position `ordinal` of [`RecordStore::keys`].
    fn get_at(&self, ordinal: usize) -> DatasetResult<AudioRecord> {
        let keys = self.keys()?;
        let key = keys.get(ordinal).ok_or(DatasetError::Index {
            index: ordinal,
            len: keys.len(),
        })?;
        self.get(key)
    }
}

fn display_key(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

// ---------------------------------------------------------------------------
// LMDB
// ---------------------------------------------------------------------------

struct LmdbHandle {
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl LmdbHandle {
    fn open(path: &Path) -> DatasetResult<Self> {
        let mut options = EnvOpenOptions::new();
        // SAFETY: the store is never written while a dataset reads it, and the
        // environment is opened once per store.
        let env = unsafe {
            options.flags(EnvFlags::READ_ONLY | EnvFlags::NO_LOCK);
            options.open(path)?
        };
        let rtxn = env.read_txn()?;
        let db: Database<Bytes, Bytes> = env
            .open_database(&rtxn, None)?
            .ok_or_else(|| DatasetError::NotFound(format!("LMDB main database in {}", path.display())))?;
        rtxn.commit()?;
        info!("LMDB открыт: {}", path.display());
        Ok(Self { env, db })
    }
}

/// LMDB-backed store, opened on first use and kept open.
pub struct LmdbStore {
    path: PathBuf,
    handle: OnceLock<LmdbHandle>,
    init_lock: Mutex<()>,
    keys: OnceLock<Vec<Vec<u8>>>,
}

impl LmdbStore {
    /// Create a store for the LMDB directory at `path`. Nothing is opened yet.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            handle: OnceLock::new(),
            init_lock: Mutex::new(()),
            keys: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn handle(&self) -> DatasetResult<&LmdbHandle> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }
        // the environment is opened once per store
        let _guard = self
            .init_lock
            .lock()
            .map_err(|_| DatasetError::Config("LMDB init lock poisoned".into()))?;
        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }
        let opened = LmdbHandle::open(&self.path)?;
        Ok(self.handle.get_or_init(|| opened))
    }
}

impl RecordStore for LmdbStore {
    fn keys(&self) -> DatasetResult<&[Vec<u8>]> {
        if let Some(keys) = self.keys.get() {
            return Ok(keys);
        }
        let handle = self.handle()?;
        let rtxn = handle.env.read_txn()?;
        let mut keys = Vec::new();
        for item in handle.db.iter(&rtxn)? {
            let (key, _) = item?;
            keys.push(key.to_vec());
        }
        debug!(count = keys.len(), "LMDB keys enumerated");
        Ok(self.keys.get_or_init(|| keys))
    }

    fn get(&self, key: &[u8]) -> DatasetResult<AudioRecord> {
        let handle = self.handle()?;
        let rtxn = handle.env.read_txn()?;
        let value = handle
            .db
            .get(&rtxn, key)?
            .ok_or_else(|| DatasetError::NotFound(display_key(key)))?;
        AudioRecord::decode(value)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// In-memory store with the same ordering as LMDB (lexicographic keys).
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<Vec<u8>, Vec<u8>>,
    keys: Vec<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, encoding it as the store would.
    pub fn insert(&mut self, key: impl Into<Vec<u8>>, record: &AudioRecord) {
        self.insert_raw(key, record.encode());
    }

    /// Insert an already encoded value.
    pub fn insert_raw(&mut self, key: impl Into<Vec<u8>>, value: Vec<u8>) {
        self.values.insert(key.into(), value);
        self.keys = self.values.keys().cloned().collect();
    }

    pub fn with_record(mut self, key: impl Into<Vec<u8>>, record: &AudioRecord) -> Self {
        self.insert(key, record);
        self
    }
}

impl RecordStore for MemoryStore {
    fn keys(&self) -> DatasetResult<&[Vec<u8>]> {
        Ok(&self.keys)
    }

    fn get(&self, key: &[u8]) -> DatasetResult<AudioRecord> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| DatasetError::NotFound(display_key(key)))?;
        AudioRecord::decode(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(length: &str) -> AudioRecord {
        AudioRecord::from_metadata([("length", length)])
    }

    #[test]
    fn test_memory_store_order() {
        let store = MemoryStore::new()
            .with_record("b", &record("2"))
            .with_record("a", &record("1"));
        assert_eq!(store.keys().unwrap(), &[b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(store.get_at(1).unwrap().length_secs().unwrap(), 2.0);
    }

    #[test]
    fn test_memory_store_missing_key() {
        let store = MemoryStore::new();
        assert!(matches!(store.get(b"nope"), Err(DatasetError::NotFound(_))));
        assert!(matches!(
            store.get_at(0),
            Err(DatasetError::Index { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_memory_store_corrupt_value() {
        let mut store = MemoryStore::new();
        store.insert_raw("bad", vec![0xff, 0xff]);
        assert!(matches!(store.get(b"bad"), Err(DatasetError::Decode(_))));
    }

    #[test]
    fn test_lmdb_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStore::open(dir.path().join("absent"));
        assert!(store.keys().is_err());
    }
}
