//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store's invariants over random operation
//! sequences, with an injected clock.

use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;

use crate::cache::{BatchEntry, CacheStore, Ttl, MAX_KEY_LENGTH};
use crate::error::ErrorKind;

// == Test Configuration ==
const NOW: i64 = 1_700_000_000;

// == Strategies ==
/// Generates valid cache keys (non-empty, within length limit)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,32}".prop_map(|s| s)
}

/// Generates raw JSON strings
fn valid_raw_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,64}".prop_map(|s| json!(s).to_string())
}

fn ttl_strategy() -> impl Strategy<Value = Ttl> {
    prop_oneof![Just(Ttl::Never), (0u64..20).prop_map(Ttl::Seconds)]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, raw: String, ttl: Ttl },
    Get { key: String },
    Delete { key: String },
    Batch { entries: Vec<BatchEntry> },
    Tick { secs: i64 },
}

fn batch_entry_strategy() -> impl Strategy<Value = BatchEntry> {
    (valid_key_strategy(), "[a-zA-Z0-9 ]{0,64}", ttl_strategy())
        .prop_map(|(key, text, ttl)| BatchEntry::new(key, json!(text), ttl))
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_raw_strategy(), ttl_strategy())
            .prop_map(|(key, raw, ttl)| CacheOp::Put { key, raw, ttl }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
        prop::collection::vec(batch_entry_strategy(), 1..8)
            .prop_map(|entries| CacheOp::Batch { entries }),
        (0i64..5).prop_map(|secs| CacheOp::Tick { secs }),
    ]
}

/// Applies one operation, advancing the clock on `Tick`.
fn apply(store: &mut CacheStore, op: CacheOp, now: &mut i64) {
    match op {
        CacheOp::Put { key, raw, ttl } => {
            let _ = store.put(&key, &raw, ttl, *now);
        }
        CacheOp::Get { key } => {
            let _ = store.get(&key, *now);
        }
        CacheOp::Delete { key } => {
            let _ = store.delete(&key);
        }
        CacheOp::Batch { entries } => {
            let _ = store.batch_create(entries, *now);
        }
        CacheOp::Tick { secs } => *now += secs,
    }
}

/// Recomputes the aggregate size from live entries.
fn live_size(store: &CacheStore) -> usize {
    store.entries().map(|entry| entry.size()).sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Round-trip: a value accepted by put is returned by an immediate get.
    #[test]
    fn prop_roundtrip_storage(
        key in valid_key_strategy(),
        raw in valid_raw_strategy(),
        ttl in ttl_strategy()
    ) {
        let mut store = CacheStore::new(1 << 20);

        prop_assert!(store.put(&key, &raw, ttl, NOW).is_empty());

        let expected: serde_json::Value = serde_json::from_str(&raw).unwrap();
        // A zero TTL is already due at NOW
        if ttl == Ttl::Seconds(0) {
            prop_assert_eq!(store.get(&key, NOW), None);
        } else {
            prop_assert_eq!(store.get(&key, NOW), Some(expected));
        }
    }

    // Delete removes the entry and a second delete reports KEY_NOT_FOUND.
    #[test]
    fn prop_delete_removes_entry(key in valid_key_strategy(), raw in valid_raw_strategy()) {
        let mut store = CacheStore::new(1 << 20);
        store.put(&key, &raw, Ttl::Never, NOW);

        prop_assert!(store.delete(&key).is_empty());
        prop_assert_eq!(store.get(&key, NOW), None);

        let errors = store.delete(&key);
        prop_assert_eq!(errors.len(), 1);
        prop_assert_eq!(errors[0].kind, ErrorKind::KeyNotFound);
        prop_assert_eq!(store.size(), 0);
    }

    // No overwrite: a second put keeps the first value.
    #[test]
    fn prop_no_overwrite(
        key in valid_key_strategy(),
        first in valid_raw_strategy(),
        second in valid_raw_strategy()
    ) {
        let mut store = CacheStore::new(1 << 20);
        store.put(&key, &first, Ttl::Never, NOW);

        let errors = store.put(&key, &second, Ttl::Never, NOW);

        prop_assert_eq!(errors.len(), 1);
        prop_assert_eq!(errors[0].kind, ErrorKind::KeyAlreadyExists);
        let expected: serde_json::Value = serde_json::from_str(&first).unwrap();
        prop_assert_eq!(store.get(&key, NOW), Some(expected));
    }

    // Capacity: aggregate size never exceeds capacity and always matches
    // the sum of live entry sizes, across any mix of puts, batches, reads
    // and deletes.
    #[test]
    fn prop_capacity_and_size_accounting(
        ops in prop::collection::vec(cache_op_strategy(), 1..200)
    ) {
        // Large enough for any single generated entry
        let capacity = 256;
        let mut store = CacheStore::new(capacity);
        let mut now = NOW;

        for op in ops {
            apply(&mut store, op, &mut now);

            prop_assert!(
                store.size() <= capacity,
                "Cache size {} exceeds capacity {}",
                store.size(),
                capacity
            );
            prop_assert_eq!(store.size(), live_size(&store));
            prop_assert_eq!(store.entries().count(), store.len());
        }
    }

    // No live entry is ever observable past its expiry.
    #[test]
    fn prop_no_expired_entry_survives_sweep(
        ops in prop::collection::vec(cache_op_strategy(), 1..100)
    ) {
        let mut store = CacheStore::new(1 << 20);
        let mut now = NOW;

        for op in ops {
            apply(&mut store, op, &mut now);

            store.sweep_expired(now);
            prop_assert!(store.entries().all(|entry| !entry.is_expired(now)));
        }
    }

    // Batch partial failure: one oversized key among valid entries yields
    // exactly one KEY_TOO_LONG and every valid entry is stored.
    #[test]
    fn prop_batch_partial_failure(
        keys in prop::collection::hash_set(valid_key_strategy(), 1..20),
        bad_at in any::<prop::sample::Index>()
    ) {
        let mut store = CacheStore::new(1 << 20);
        let keys: Vec<String> = keys.into_iter().collect();
        let mut batch: Vec<BatchEntry> = keys
            .iter()
            .map(|key| BatchEntry::new(key.clone(), json!(key), Ttl::Never))
            .collect();
        let bad_key = "k".repeat(MAX_KEY_LENGTH + 1);
        batch.insert(
            bad_at.index(batch.len() + 1),
            BatchEntry::new(bad_key.clone(), json!(0), Ttl::Never),
        );

        let errors = store.batch_create(batch, NOW);

        prop_assert_eq!(errors.len(), 1);
        prop_assert_eq!(errors[0].kind, ErrorKind::KeyTooLong);
        prop_assert_eq!(&errors[0].key, &bad_key);
        for key in &keys {
            prop_assert_eq!(store.get(key, NOW), Some(json!(key)));
        }
    }
}

// Property tests for LRU eviction behavior
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Filling the store and touching one key makes the oldest untouched key
    // the first eviction victim.
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::vec("[a-z]{4}", 3..10),
        touched in any::<prop::sample::Index>()
    ) {
        // Deduplicate keys to ensure we have unique entries
        let mut seen = HashSet::new();
        let unique_keys: Vec<String> = initial_keys
            .into_iter()
            .filter(|key| seen.insert(key.clone()))
            .collect();
        prop_assume!(unique_keys.len() >= 3);

        // Every entry is a 4-byte key plus a 1-byte value
        let capacity = unique_keys.len() * 5;
        let mut store = CacheStore::new(capacity);
        for key in &unique_keys {
            prop_assert!(store.put(key, "1", Ttl::Never, NOW).is_empty());
        }

        let touched_key = unique_keys[touched.index(unique_keys.len())].clone();
        store.get(&touched_key, NOW);

        let victim = unique_keys
            .iter()
            .find(|key| **key != touched_key)
            .cloned()
            .unwrap();

        // Five-character key cannot collide with the generated four-character ones
        store.put("fresh", "1", Ttl::Never, NOW);

        prop_assert!(!store.contains_key(&victim), "Key '{}' should have been evicted", victim);
        prop_assert!(store.contains_key(&touched_key));
        prop_assert!(store.contains_key("fresh"));
        prop_assert!(store.size() <= capacity);
    }
}
