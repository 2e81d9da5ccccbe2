//! Cache Module
//!
//! Provides the in-memory engine: byte-bounded LRU eviction over a slab
//! backed recency list, and lazy TTL expiry driven by a min-ordered queue.

pub mod codec;
mod entry;
mod expiry;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp, BatchEntry, CacheEntry, Expiry, Ttl};
pub use expiry::ExpiryQueue;
pub use lru::{EntryId, RecencyList};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 32;

/// Maximum allowed serialized value size in bytes
pub const MAX_VALUE_SIZE: usize = 16 * 1024; // 16 KiB

/// Default byte capacity of a store
pub const DEFAULT_CAPACITY: usize = 1024 * 1024 * 1024; // 1 GiB
