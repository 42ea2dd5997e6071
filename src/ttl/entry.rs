//! TTL Entry Module
//!
//! Defines a timed entry and its countdown arithmetic.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == TTL Entry ==
/// An entry that counts down from `ttl_seconds` starting at `start_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TtlEntry {
    pub key: String,
    pub value: String,
    pub ttl_seconds: u64,
    pub start_time: DateTime<Utc>,
}

impl TtlEntry {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        ttl_seconds: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ttl_seconds,
            start_time: now,
        }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_seconds.saturating_mul(1000)
    }

    // == Remaining Time ==
    /// Milliseconds left at `now`, floored at zero.
    ///
    /// A `now` earlier than `start_time` counts as no time elapsed.
    pub fn remaining_ms(&self, now: DateTime<Utc>) -> u64 {
        let elapsed = (now - self.start_time).num_milliseconds().max(0) as u64;
        self.ttl_ms().saturating_sub(elapsed)
    }

    /// Fraction of the lifetime already consumed, in [0, 1].
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        let total = self.ttl_ms();
        if total == 0 {
            return 1.0;
        }
        let fraction = 1.0 - self.remaining_ms(now) as f64 / total as f64;
        fraction.clamp(0.0, 1.0)
    }

    /// Expired once the remaining time has reached zero.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_ms(now) == 0
    }
}
