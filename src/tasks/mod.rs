//! Background Tasks Module
//!
//! Periodic work that runs alongside the HTTP surface.
//!
//! # Tasks
//! - TTL Ticker: advances the TTL simulator and evicts expired keys

mod ticker;

pub use ticker::spawn_ttl_ticker;
