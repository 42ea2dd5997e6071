//! TTL Module
//!
//! Simulates countdown and expiry of timed entries.

mod entry;
mod simulator;

pub use entry::TtlEntry;
pub use simulator::TtlState;
