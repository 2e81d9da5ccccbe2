//! Expiry Queue Module
//!
//! Min-ordered queue of `(instant, key)` records used for lazy TTL sweeps.
//!
//! Records are never removed when their entry changes. A popped record may
//! therefore be stale, and callers must compare it against the entry's
//! current expiry before acting on it.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

// == Expiry Queue ==
#[derive(Debug, Default)]
pub struct ExpiryQueue {
    heap: BinaryHeap<Reverse<(i64, String)>>,
}

impl ExpiryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `key` to be checked once the clock reaches `instant`.
    pub fn push(&mut self, instant: i64, key: String) {
        self.heap.push(Reverse((instant, key)));
    }

    /// Pops the earliest record if it is due at `now`.
    pub fn pop_due(&mut self, now: i64) -> Option<(i64, String)> {
        match self.heap.peek() {
            Some(Reverse((instant, _))) if *instant <= now => {
                self.heap.pop().map(|Reverse(record)| record)
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
