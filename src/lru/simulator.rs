//! LRU Simulator Module
//!
//! Pure state transitions of a bounded, recency-ordered cache.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Result, SimError};
use crate::lru::{CacheEntry, LruStats};

// == Touch Outcome ==
/// What an `insert_or_touch` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchOutcome {
    /// `true` when the key was already present
    pub hit: bool,
    /// Keys pushed out of the tail, oldest first
    pub evicted: Vec<String>,
}

// == LRU Cache State ==
/// Bounded recency-ordered collection.
///
/// Entries are stored in a VecDeque where:
/// - Front = Most recently used (position 0)
/// - Back = Least recently used
#[derive(Debug, Clone, PartialEq)]
pub struct LruCacheState {
    capacity: usize,
    entries: VecDeque<CacheEntry>,
    stats: LruStats,
}

impl LruCacheState {
    // == Constructor ==
    /// Creates an empty simulator with the given capacity.
    pub fn new(capacity: usize) -> Result<Self> {
        validate_capacity(capacity)?;
        Ok(Self {
            capacity,
            entries: VecDeque::new(),
            stats: LruStats::new(),
        })
    }

    // == Insert Or Touch ==
    /// Moves `key` to the front, inserting it if absent, then evicts from the tail.
    ///
    /// A present key counts as a hit and keeps its value unless `value` is given.
    /// An absent key counts as a miss and is inserted with `value` (empty if none).
    pub fn insert_or_touch(
        &mut self,
        key: &str,
        value: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<TouchOutcome> {
        validate_key(key)?;

        let hit = match self.take(key) {
            Some(mut entry) => {
                entry.touch(value, now);
                self.entries.push_front(entry);
                self.stats.record_hit();
                true
            }
            None => {
                self.entries
                    .push_front(CacheEntry::new(key, value.unwrap_or_default(), now));
                self.stats.record_miss();
                false
            }
        };

        let evicted = self.evict_to_capacity();
        self.reindex();
        Ok(TouchOutcome { hit, evicted })
    }

    // == Access ==
    /// Hit branch of `insert_or_touch` for a key the caller knows is present.
    ///
    /// Calling this with an absent key is a caller error; no counter changes.
    pub fn access(&mut self, key: &str, now: DateTime<Utc>) -> Result<()> {
        let mut entry = self
            .take(key)
            .ok_or_else(|| SimError::NotFound(key.to_string()))?;
        entry.touch(None, now);
        self.entries.push_front(entry);
        self.stats.record_hit();
        self.reindex();
        Ok(())
    }

    // == Delete ==
    /// Removes `key` if present. Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.take(key).is_some();
        if removed {
            self.reindex();
        }
        removed
    }

    // == Clear ==
    /// Empties the cache; counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Set Capacity ==
    /// Changes the capacity, evicting from the tail when shrinking.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<Vec<String>> {
        validate_capacity(capacity)?;
        self.capacity = capacity;
        let evicted = self.evict_to_capacity();
        self.reindex();
        Ok(evicted)
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    // == Accessors ==
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Entries from most to least recently used.
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.iter()
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }

    pub fn stats(&self) -> &LruStats {
        &self.stats
    }

    pub fn hit_rate(&self) -> f64 {
        self.stats.hit_rate()
    }

    fn take(&mut self, key: &str) -> Option<CacheEntry> {
        let index = self.entries.iter().position(|e| e.key == key)?;
        self.entries.remove(index)
    }

    fn evict_to_capacity(&mut self) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            match self.entries.pop_back() {
                Some(entry) => {
                    debug!(key = %entry.key, "LRU eviction");
                    self.stats.record_eviction();
                    evicted.push(entry.key);
                }
                None => break,
            }
        }
        evicted
    }

    fn reindex(&mut self) {
        for (position, entry) in self.entries.iter_mut().enumerate() {
            entry.position = position;
        }
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(SimError::validation("Key cannot be empty"));
    }
    Ok(())
}

fn validate_capacity(capacity: usize) -> Result<()> {
    if capacity < 1 {
        return Err(SimError::validation("Capacity must be at least 1"));
    }
    Ok(())
}
