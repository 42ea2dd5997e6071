//! TTL Simulator Module
//!
//! Pure state transitions for timed entries. Expiry is observed by `tick`,
//! so an entry may outlive its TTL by up to one tick interval.

use chrono::{DateTime, Utc};

use crate::error::{Result, SimError};
use crate::ttl::TtlEntry;

// == TTL State ==
/// Timed entries in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TtlState {
    entries: Vec<TtlEntry>,
}

impl TtlState {
    pub fn new() -> Self {
        Self::default()
    }

    // == Add ==
    /// Starts a countdown for a new key.
    ///
    /// Keys are not refreshed in place: adding a present key is rejected and
    /// callers must `remove` first.
    pub fn add(
        &mut self,
        key: &str,
        value: impl Into<String>,
        ttl_seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if key.is_empty() {
            return Err(SimError::validation("Key cannot be empty"));
        }
        if ttl_seconds == 0 {
            return Err(SimError::validation("TTL must be positive"));
        }
        if self.contains(key) {
            return Err(SimError::validation(format!(
                "Key '{}' already has a TTL; remove it first",
                key
            )));
        }

        self.entries.push(TtlEntry::new(key, value, ttl_seconds, now));
        Ok(())
    }

    // == Tick ==
    /// Removes and returns every entry whose remaining time reached zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<TtlEntry> {
        let (expired, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.is_expired(now));
        self.entries = live;
        expired
    }

    // == Remove ==
    /// Early deletion. Returns the removed entry, if any.
    pub fn remove(&mut self, key: &str) -> Option<TtlEntry> {
        let index = self.entries.iter().position(|e| e.key == key)?;
        Some(self.entries.remove(index))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&TtlEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn entries(&self) -> &[TtlEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
