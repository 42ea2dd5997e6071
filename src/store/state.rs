//! Dashboard State
//!
//! The single state tree owned by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cluster::{Keyspace, MetricsHistory, NodeTable};
use crate::error::Result;
use crate::lru::LruCacheState;
use crate::notifications::NotificationCenter;
use crate::pubsub::PubSubState;
use crate::ttl::TtlState;

// == Connection ==

/// Lifecycle of the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Reconnecting,
    /// Reconnect attempts exhausted; fallback polling is active
    Disabled,
    /// Closed on request, outside the reconnect cycle
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Reconnect attempts since the last successful open
    pub attempts: u32,
    pub last_connected_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Result of the last fallback health poll
    pub collector_reachable: Option<bool>,
    pub last_polled_at: Option<DateTime<Utc>>,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Connecting,
            attempts: 0,
            last_connected_at: None,
            last_error: None,
            collector_reachable: None,
            last_polled_at: None,
        }
    }
}

// == Dashboard State ==

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub lru: LruCacheState,
    pub ttl: TtlState,
    pub notifications: NotificationCenter,
    pub connection: ConnectionStatus,
    pub keys: Keyspace,
    pub nodes: NodeTable,
    pub metrics: MetricsHistory,
    pub pubsub: PubSubState,
}

impl DashboardState {
    pub fn new(lru_capacity: usize, metrics_history_len: usize) -> Result<Self> {
        Ok(Self {
            lru: LruCacheState::new(lru_capacity)?,
            ttl: TtlState::new(),
            notifications: NotificationCenter::new(),
            connection: ConnectionStatus::default(),
            keys: Keyspace::new(),
            nodes: NodeTable::new(),
            metrics: MetricsHistory::new(metrics_history_len),
            pubsub: PubSubState::new(),
        })
    }
}
