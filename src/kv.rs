//! Shared Store Handle
//!
//! [`KvCache`] puts the in-memory [`CacheStore`] and its [`SnapshotFile`]
//! behind one mutex. Every public operation holds the lock for its full
//! duration, snapshot rewrite included, so operations from any number of
//! threads are applied one at a time.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{error, info};

use crate::cache::{current_timestamp, BatchEntry, CacheStats, CacheStore, Ttl};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::persistence::SnapshotFile;

struct Shared {
    store: CacheStore,
    file: SnapshotFile,
}

impl Shared {
    /// Rewrites the snapshot if live entries changed since the last write.
    ///
    /// A failed write is logged; the in-memory mutation stands.
    fn persist(&mut self) {
        if !self.store.take_dirty() {
            return;
        }
        if let Err(err) = self.file.write(self.store.entries()) {
            error!("Failed to write snapshot: {}", err);
        }
    }
}

// == KvCache ==
/// Thread-safe, file-persisted cache. Share it across threads with `Arc`.
pub struct KvCache {
    inner: Mutex<Shared>,
    path: PathBuf,
}

impl KvCache {
    // == Open ==
    /// Opens the store backed by `path`, restoring any live persisted entries.
    ///
    /// Fails if another owner holds the file's lock.
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let mut file = SnapshotFile::open(path)?;
        let path = file.path().to_path_buf();
        let entries = file.read_entries()?;

        let mut store = CacheStore::new(capacity);
        let loaded = store.load(entries, current_timestamp());

        // Drop elapsed records from the file right away
        file.write(store.entries())?;
        store.take_dirty();

        info!(
            "Opened store {}: {} entries, {} of {} bytes",
            path.display(),
            loaded,
            store.size(),
            capacity
        );

        Ok(Self {
            inner: Mutex::new(Shared { store, file }),
            path,
        })
    }

    /// Opens the store described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(&config.data_file, config.capacity)
    }

    // == Get ==
    /// Returns the value stored under `key`, or None if absent or expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut shared = self.inner.lock();
        let value = shared.store.get(key, current_timestamp());
        shared.persist();
        value
    }

    // == Put ==
    /// Stores raw JSON text under a new key. Returns the errors, if any.
    pub fn put(&self, key: &str, raw: &str, ttl: Ttl) -> Vec<CacheError> {
        let mut shared = self.inner.lock();
        let errors = shared.store.put(key, raw, ttl, current_timestamp());
        shared.persist();
        errors
    }

    /// Like [`put`](Self::put), handing the errors to `callback` once the
    /// lock is released.
    pub fn put_with<F, R>(&self, key: &str, raw: &str, ttl: Ttl, callback: F) -> R
    where
        F: FnOnce(&[CacheError]) -> R,
    {
        let errors = self.put(key, raw, ttl);
        callback(&errors)
    }

    // == Delete ==
    pub fn delete(&self, key: &str) -> Vec<CacheError> {
        let mut shared = self.inner.lock();
        let errors = shared.store.delete(key);
        shared.persist();
        errors
    }

    pub fn delete_with<F, R>(&self, key: &str, callback: F) -> R
    where
        F: FnOnce(&[CacheError]) -> R,
    {
        let errors = self.delete(key);
        callback(&errors)
    }

    // == Batch Create ==
    /// Inserts every entry it can, writing a single snapshot afterwards.
    ///
    /// The result holds one error per rejected entry.
    pub fn batch_create(&self, entries: Vec<BatchEntry>) -> Vec<CacheError> {
        let mut shared = self.inner.lock();
        let errors = shared.store.batch_create(entries, current_timestamp());
        shared.persist();
        errors
    }

    pub fn batch_create_with<F, R>(&self, entries: Vec<BatchEntry>, callback: F) -> R
    where
        F: FnOnce(&[CacheError]) -> R,
    {
        let errors = self.batch_create(entries);
        callback(&errors)
    }

    // == Close ==
    /// Writes a final snapshot, syncs it to disk and releases the file lock.
    pub fn close(self) -> Result<()> {
        let Shared { store, mut file } = self.inner.into_inner();
        file.write(store.entries())?;
        file.sync()?;
        file.unlock()?;
        info!("Closed store {}", self.path.display());
        Ok(())
    }

    // == Accessors ==
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().store.stats()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().store.is_empty()
    }

    /// Current aggregate size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.inner.lock().store.size()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().store.capacity()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for KvCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvCache").field("path", &self.path).finish()
    }
}
