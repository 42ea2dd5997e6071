//! LRU Statistics Module
//!
//! Tracks simulator counters: hits, misses and evictions.

use serde::Serialize;

// == LRU Stats ==
/// Counters of the LRU simulator.
///
/// Counters survive `clear()`; only `reset()` zeroes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LruStats {
    /// Touches of a key already present
    pub hits: u64,
    /// Inserts of a key not yet present
    pub misses: u64,
    /// Entries pushed out of the tail by capacity pressure
    pub evictions: u64,
}

impl LruStats {
    // == Constructor ==
    /// Creates a new LruStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if nothing has been recorded.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Reset ==
    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
