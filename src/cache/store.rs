//! Cache Store Module
//!
//! Main cache engine combining a key index with the slab recency list and
//! the lazily-invalidated expiry queue.
//!
//! The store itself is single-threaded and clock-free: every operation takes
//! `now` in Unix seconds. Locking and persistence live in [`crate::KvCache`].

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::cache::{
    codec, BatchEntry, CacheEntry, CacheStats, EntryId, Expiry, ExpiryQueue, RecencyList, Ttl,
    MAX_KEY_LENGTH, MAX_VALUE_SIZE,
};
use crate::error::CacheError;

// == Cache Store ==
/// Byte-bounded LRU store with lazy TTL expiry.
#[derive(Debug)]
pub struct CacheStore {
    /// Key to recency-list handle
    index: HashMap<String, EntryId>,
    /// Entries ordered most to least recently used
    recency: RecencyList<CacheEntry>,
    /// Pending expiry records, possibly stale
    expiry: ExpiryQueue,
    /// Performance statistics
    stats: CacheStats,
    /// Sum of entry sizes
    size: usize,
    /// Byte capacity
    capacity: usize,
    /// Set whenever live entries change; cleared by `take_dirty`
    dirty: bool,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            index: HashMap::new(),
            recency: RecencyList::new(),
            expiry: ExpiryQueue::new(),
            stats: CacheStats::new(),
            size: 0,
            capacity,
            dirty: false,
        }
    }

    // == Get ==
    /// Retrieves a value by key and marks it most recently used.
    ///
    /// Expired entries are swept first, so an elapsed key reads as absent.
    pub fn get(&mut self, key: &str, now: i64) -> Option<Value> {
        self.sweep_expired(now);

        let Some(&id) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };

        self.recency.move_to_front(id);
        self.stats.record_hit();
        self.recency.get(id).map(|entry| entry.value.clone())
    }

    // == Put ==
    /// Stores raw JSON text under a new key.
    ///
    /// Validation short-circuits in order: key length, raw value length,
    /// key already present, value decoding, canonical value length. A failed
    /// validation leaves the store untouched apart from the initial expiry
    /// sweep.
    pub fn put(&mut self, key: &str, raw: &str, ttl: Ttl, now: i64) -> Vec<CacheError> {
        self.sweep_expired(now);

        match self.try_put(key, raw, ttl, now) {
            Ok(()) => Vec::new(),
            Err(err) => vec![err],
        }
    }

    fn try_put(&mut self, key: &str, raw: &str, ttl: Ttl, now: i64) -> Result<(), CacheError> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::key_too_long(key, raw));
        }
        if raw.len() > MAX_VALUE_SIZE {
            return Err(CacheError::value_too_long(key, raw));
        }
        if self.index.contains_key(key) {
            return Err(CacheError::key_already_exists(key, raw));
        }
        let value = codec::decode(raw).map_err(|err| CacheError::unknown(key, raw, err))?;
        // Canonical form can outgrow the raw text (e.g. `1e9` -> `1000000000.0`)
        if codec::encode(&value).len() > MAX_VALUE_SIZE {
            return Err(CacheError::value_too_long(key, raw));
        }

        self.insert(CacheEntry::new(key.to_string(), value, ttl.deadline(now)));
        Ok(())
    }

    // == Batch Create ==
    /// Inserts each item independently, collecting one error per failed item.
    ///
    /// Failures never roll back items that were already inserted.
    pub fn batch_create(&mut self, entries: Vec<BatchEntry>, now: i64) -> Vec<CacheError> {
        self.sweep_expired(now);

        entries
            .into_iter()
            .filter_map(|entry| self.try_create(entry, now).err())
            .collect()
    }

    fn try_create(&mut self, entry: BatchEntry, now: i64) -> Result<(), CacheError> {
        let BatchEntry { key, value, ttl } = entry;
        let encoded = codec::encode(&value);

        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::key_too_long(&key, encoded));
        }
        if encoded.len() > MAX_VALUE_SIZE {
            return Err(CacheError::value_too_long(&key, encoded));
        }
        if self.index.contains_key(&key) {
            return Err(CacheError::key_already_exists(&key, encoded));
        }

        let expiry = ttl.deadline(now);
        self.insert(CacheEntry::new(key, value, expiry));
        Ok(())
    }

    // == Delete ==
    /// Removes an entry by key. Does not sweep.
    pub fn delete(&mut self, key: &str) -> Vec<CacheError> {
        match self.index.get(key).copied() {
            Some(id) => {
                self.remove(key, id);
                Vec::new()
            }
            None => vec![CacheError::key_not_found(key)],
        }
    }

    // == Sweep Expired ==
    /// Removes every entry whose expiry is due at `now`.
    ///
    /// Queue records whose key is gone, or whose instant no longer matches
    /// the entry's current expiry, are discarded as stale.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self, now: i64) -> usize {
        let mut removed = 0;

        while let Some((instant, key)) = self.expiry.pop_due(now) {
            let Some(&id) = self.index.get(&key) else {
                continue;
            };
            let current = self.recency.get(id).map(|entry| entry.expiry);
            if current != Some(Expiry::At(instant)) {
                continue;
            }
            self.remove(&key, id);
            self.stats.record_expiration();
            removed += 1;
        }

        if removed > 0 {
            debug!("TTL sweep: removed {} expired entries", removed);
        }
        removed
    }

    // == Load ==
    /// Restores persisted entries into an existing store.
    ///
    /// Keys already present and entries already elapsed at `now` are
    /// skipped. Loading stops at the first entry that would overflow the
    /// capacity. Returns the number of entries loaded.
    pub fn load<I>(&mut self, entries: I, now: i64) -> usize
    where
        I: IntoIterator<Item = CacheEntry>,
    {
        let mut loaded = 0;

        for entry in entries {
            if self.index.contains_key(&entry.key) || entry.is_expired(now) {
                continue;
            }
            if self.size + entry.size() > self.capacity {
                debug!(
                    "Load stopped at key '{}': capacity of {} bytes reached",
                    entry.key, self.capacity
                );
                break;
            }
            self.insert(entry);
            loaded += 1;
        }

        loaded
    }

    fn insert(&mut self, entry: CacheEntry) {
        self.make_room(entry.size());

        self.size += entry.size();
        if let Expiry::At(instant) = entry.expiry {
            self.expiry.push(instant, entry.key.clone());
        }
        let key = entry.key.clone();
        let id = self.recency.push_front(entry);
        self.index.insert(key, id);
        self.dirty = true;
    }

    // == Eviction ==
    /// Evicts least recently used entries until `incoming` bytes fit.
    ///
    /// An entry larger than the whole capacity empties the store and is
    /// still inserted by the caller.
    fn make_room(&mut self, incoming: usize) {
        while self.size + incoming > self.capacity {
            let Some(evicted) = self.recency.remove_lru() else {
                break;
            };
            self.index.remove(&evicted.key);
            self.size -= evicted.size();
            self.stats.record_eviction();
            self.dirty = true;
            debug!("Evicted key '{}' ({} bytes)", evicted.key, evicted.size());
        }
    }

    fn remove(&mut self, key: &str, id: EntryId) {
        self.index.remove(key);
        if let Some(entry) = self.recency.remove(id) {
            self.size -= entry.size();
        }
        self.dirty = true;
    }

    // == Dirty Tracking ==
    /// Reports whether live entries changed since the last call, and resets.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    // == Accessors ==
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Iterates entries from most to least recently used.
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> + '_ {
        self.recency.iter()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.index.len();
        stats.size_bytes = self.size;
        stats
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Current aggregate size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
