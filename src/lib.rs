//! kvscope - simulation and synchronization core for a key-value dashboard
//!
//! Provides LRU and TTL simulators, an observable store with auto-expiring
//! notifications, and a resilient push-channel client for a live collector.

pub mod api;
pub mod cluster;
pub mod config;
pub mod error;
pub mod lru;
pub mod models;
pub mod notifications;
pub mod pubsub;
pub mod push;
pub mod store;
pub mod tasks;
pub mod ttl;

pub use api::AppState;
pub use config::Config;
pub use error::{ChannelError, SimError};
pub use push::{PushClient, PushHandle};
pub use store::{ConnectionState, DashboardState, Store};
pub use tasks::spawn_ttl_ticker;
