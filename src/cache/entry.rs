//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde_json::Value;

use crate::cache::codec;

// == Expiry ==
/// Absolute expiry instant of an entry, in Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expiry {
    /// The entry never expires
    Never,
    /// The entry expires once the clock reaches this instant
    At(i64),
}

impl Expiry {
    /// Decodes the persisted form, where any negative number means "never".
    pub fn from_raw(raw: i64) -> Self {
        if raw < 0 {
            Expiry::Never
        } else {
            Expiry::At(raw)
        }
    }

    /// Encodes to the persisted form (`-1` for "never").
    pub fn to_raw(self) -> i64 {
        match self {
            Expiry::Never => -1,
            Expiry::At(instant) => instant,
        }
    }

    /// Boundary condition: an instant equal to `now` has elapsed.
    pub fn has_elapsed(self, now: i64) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(instant) => instant <= now,
        }
    }
}

// == Ttl ==
/// Relative time-to-live requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    #[default]
    Never,
    Seconds(u64),
}

impl Ttl {
    /// Builds a TTL from a signed second count; negative means "never".
    pub fn from_secs(secs: i64) -> Self {
        if secs < 0 {
            Ttl::Never
        } else {
            Ttl::Seconds(secs as u64)
        }
    }

    /// Resolves the TTL into an absolute expiry relative to `now`.
    pub fn deadline(self, now: i64) -> Expiry {
        match self {
            Ttl::Never => Expiry::Never,
            Ttl::Seconds(secs) => {
                Expiry::At(now.saturating_add(i64::try_from(secs).unwrap_or(i64::MAX)))
            }
        }
    }
}

impl From<i64> for Ttl {
    fn from(secs: i64) -> Self {
        Ttl::from_secs(secs)
    }
}

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The entry key
    pub key: String,
    /// The decoded value
    pub value: Value,
    /// Absolute expiry instant
    pub expiry: Expiry,
    /// Accounted size: key bytes plus canonical value bytes
    size: usize,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(key: String, value: Value, expiry: Expiry) -> Self {
        let size = key.len() + codec::encode(&value).len();
        Self {
            key,
            value,
            expiry,
            size,
        }
    }

    /// Bytes this entry contributes to the store's aggregate size.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expiry.has_elapsed(now)
    }
}

// == Batch Entry ==
/// One item of a batch create.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub key: String,
    pub value: Value,
    pub ttl: Ttl,
}

impl BatchEntry {
    pub fn new(key: impl Into<String>, value: Value, ttl: Ttl) -> Self {
        Self {
            key: key.into(),
            value,
            ttl,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_size_counts_key_and_canonical_value() {
        let entry = CacheEntry::new("key".to_string(), json!({"a": 1}), Expiry::Never);
        // "key" + {"a":1}
        assert_eq!(entry.size(), 3 + 7);
    }

    #[test]
    fn test_expiry_raw_round_trip() {
        assert_eq!(Expiry::from_raw(-1), Expiry::Never);
        assert_eq!(Expiry::from_raw(-42), Expiry::Never);
        assert_eq!(Expiry::from_raw(1_700_000_000), Expiry::At(1_700_000_000));
        assert_eq!(Expiry::Never.to_raw(), -1);
        assert_eq!(Expiry::At(5).to_raw(), 5);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("k".to_string(), json!(1), Expiry::At(100));
        assert!(!entry.is_expired(99));
        assert!(entry.is_expired(100), "Entry should be expired at boundary");
        assert!(entry.is_expired(101));
    }

    #[test]
    fn test_never_expires() {
        let entry = CacheEntry::new("k".to_string(), json!(null), Expiry::Never);
        assert!(!entry.is_expired(i64::MAX));
    }

    #[test]
    fn test_ttl_from_secs() {
        assert_eq!(Ttl::from_secs(-1), Ttl::Never);
        assert_eq!(Ttl::from(0), Ttl::Seconds(0));
        assert_eq!(Ttl::from_secs(30), Ttl::Seconds(30));
    }

    #[test]
    fn test_ttl_deadline() {
        assert_eq!(Ttl::Never.deadline(1000), Expiry::Never);
        assert_eq!(Ttl::Seconds(2).deadline(1000), Expiry::At(1002));
        assert_eq!(Ttl::Seconds(u64::MAX).deadline(1000), Expiry::At(i64::MAX));
    }

    #[test]
    fn test_current_timestamp_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(current_timestamp() > 1_577_836_800);
    }
}
