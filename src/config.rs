//! Configuration Module
//!
//! Handles loading store configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::DEFAULT_CAPACITY;

/// Default location of the backing file
pub const DEFAULT_DATA_FILE: &str = "./data-store.json";

/// Store configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the snapshot file backing the store
    pub data_file: PathBuf,
    /// Byte capacity of the store
    pub capacity: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SNAPCACHE_DATA_FILE` - Backing file path (default: ./data-store.json)
    /// - `SNAPCACHE_CAPACITY` - Capacity in bytes (default: 1 GiB)
    pub fn from_env() -> Self {
        Self {
            data_file: env::var("SNAPCACHE_DATA_FILE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE)),
            capacity: env::var("SNAPCACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CAPACITY),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            capacity: DEFAULT_CAPACITY,
        }
    }
}
