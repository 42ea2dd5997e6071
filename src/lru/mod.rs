//! LRU Module
//!
//! Simulates least-recently-used eviction over a bounded cache.

mod entry;
mod simulator;
mod stats;


pub use entry::CacheEntry;
pub use simulator::{LruCacheState, TouchOutcome};
pub use stats::LruStats;
