//! LRU Entry Module
//!
//! Defines a single slot of the simulated LRU cache.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Entry ==
/// One key held by the LRU simulator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub key: String,
    /// Opaque payload
    pub value: String,
    /// Number of inserts and touches seen by this key
    pub access_count: u64,
    pub last_accessed_at: DateTime<Utc>,
    /// Recency rank, 0 = most recently used
    pub position: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a freshly inserted entry; it counts as its own first access.
    pub fn new(key: impl Into<String>, value: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            access_count: 1,
            last_accessed_at: now,
            position: 0,
        }
    }

    // == Touch ==
    /// Records another access, optionally replacing the payload.
    pub fn touch(&mut self, value: Option<String>, now: DateTime<Utc>) {
        if let Some(value) = value {
            self.value = value;
        }
        self.access_count += 1;
        self.last_accessed_at = now;
    }
}
