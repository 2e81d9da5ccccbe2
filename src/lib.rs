//! Snapcache - An embeddable, file-persisted key-value cache
//!
//! Provides byte-bounded LRU eviction, per-entry TTL expiry and a JSON
//! snapshot on disk that mirrors every completed mutation.

pub mod cache;
pub mod config;
pub mod error;
pub mod kv;
pub mod persistence;

pub use cache::{BatchEntry, CacheStats, Ttl};
pub use config::Config;
pub use error::{CacheError, ErrorKind, OpenError};
pub use kv::KvCache;
