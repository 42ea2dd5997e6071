//! Response DTOs for the dashboard API
//!
//! Defines the structure of outgoing HTTP response bodies. Derived values
//! (hit rate, remaining time, progress) are computed here at read time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cluster::{replicas_of, ClusterNode, KeyInfo, NodeTable, TimedSample};
use crate::lru::{CacheEntry, LruCacheState, TouchOutcome};
use crate::notifications::{Notification, NotificationCenter};
use crate::pubsub::{ChannelInfo, PubSubState, PublishedMessage};
use crate::store::{ConnectionStatus, DashboardState};
use crate::ttl::{TtlEntry, TtlState};

/// Response body for the LRU view (GET /lru)
#[derive(Debug, Clone, Serialize)]
pub struct LruResponse {
    pub capacity: usize,
    pub size: usize,
    /// Most recently used first
    pub entries: Vec<CacheEntry>,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// hits / (hits + misses), 0 when nothing was looked up
    pub hit_rate: f64,
}

impl LruResponse {
    pub fn from_state(lru: &LruCacheState) -> Self {
        let stats = lru.stats();
        Self {
            capacity: lru.capacity(),
            size: lru.len(),
            entries: lru.entries().cloned().collect(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            hit_rate: lru.hit_rate(),
        }
    }
}

/// Response body for PUT /lru
#[derive(Debug, Clone, Serialize)]
pub struct TouchResponse {
    pub key: String,
    pub hit: bool,
    pub evicted: Vec<String>,
}

impl TouchResponse {
    pub fn new(key: impl Into<String>, outcome: TouchOutcome) -> Self {
        Self {
            key: key.into(),
            hit: outcome.hit,
            evicted: outcome.evicted,
        }
    }
}

/// Response body for PUT /lru/capacity
#[derive(Debug, Clone, Serialize)]
pub struct CapacityResponse {
    pub capacity: usize,
    pub evicted: Vec<String>,
}

/// One TTL entry with its countdown evaluated at response time.
#[derive(Debug, Clone, Serialize)]
pub struct TtlEntryResponse {
    pub key: String,
    pub value: String,
    pub ttl_seconds: u64,
    pub start_time: DateTime<Utc>,
    pub remaining_ms: u64,
    /// Elapsed fraction of the TTL, in [0, 1]
    pub progress: f64,
    pub expired: bool,
}

impl TtlEntryResponse {
    pub fn from_entry(entry: &TtlEntry, now: DateTime<Utc>) -> Self {
        Self {
            key: entry.key.clone(),
            value: entry.value.clone(),
            ttl_seconds: entry.ttl_seconds,
            start_time: entry.start_time,
            remaining_ms: entry.remaining_ms(now),
            progress: entry.progress(now),
            expired: entry.is_expired(now),
        }
    }
}

/// Response body for the TTL view (GET /ttl)
#[derive(Debug, Clone, Serialize)]
pub struct TtlResponse {
    pub entries: Vec<TtlEntryResponse>,
}

impl TtlResponse {
    pub fn from_state(ttl: &TtlState, now: DateTime<Utc>) -> Self {
        Self {
            entries: ttl
                .entries()
                .iter()
                .map(|entry| TtlEntryResponse::from_entry(entry, now))
                .collect(),
        }
    }
}

/// Response body for GET /notifications
#[derive(Debug, Clone, Serialize)]
pub struct NotificationsResponse {
    pub unread: usize,
    pub total: usize,
    /// The newest notifications that fit on screen
    pub notifications: Vec<Notification>,
}

impl NotificationsResponse {
    pub fn from_center(center: &NotificationCenter) -> Self {
        Self {
            unread: center.unread_count(),
            total: center.len(),
            notifications: center.visible().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PubSubResponse {
    pub channels: BTreeMap<String, ChannelInfo>,
    pub recent: Vec<PublishedMessage>,
}

impl PubSubResponse {
    pub fn from_state(pubsub: &PubSubState) -> Self {
        Self {
            channels: pubsub.channels().clone(),
            recent: pubsub.recent().cloned().collect(),
        }
    }
}

/// Response body for the pub/sub actions; `count` is the subscriber count
/// or, for publish, the number of receivers.
#[derive(Debug, Clone, Serialize)]
pub struct PubSubCountResponse {
    pub channel: String,
    pub count: u32,
}

impl PubSubCountResponse {
    pub fn new(channel: impl Into<String>, count: u32) -> Self {
        Self {
            channel: channel.into(),
            count,
        }
    }
}

/// A cluster node with the ids of the replicas following it.
#[derive(Debug, Clone, Serialize)]
pub struct NodeResponse {
    #[serde(flatten)]
    pub node: ClusterNode,
    pub replicas: Vec<String>,
}

impl NodeResponse {
    pub fn from_table(nodes: &NodeTable) -> Vec<Self> {
        nodes
            .values()
            .map(|node| Self {
                replicas: replicas_of(nodes, &node.id).map(|r| r.id.clone()).collect(),
                node: node.clone(),
            })
            .collect()
    }
}

/// Response body for GET /state
#[derive(Debug, Clone, Serialize)]
pub struct StateResponse {
    pub lru: LruResponse,
    pub ttl: TtlResponse,
    pub notifications: NotificationsResponse,
    pub connection: ConnectionStatus,
    pub keys: Vec<KeyInfo>,
    pub nodes: Vec<NodeResponse>,
    pub metrics: Vec<TimedSample>,
    pub pubsub: PubSubResponse,
}

impl StateResponse {
    pub fn from_state(state: &DashboardState, now: DateTime<Utc>) -> Self {
        Self {
            lru: LruResponse::from_state(&state.lru),
            ttl: TtlResponse::from_state(&state.ttl, now),
            notifications: NotificationsResponse::from_center(&state.notifications),
            connection: state.connection.clone(),
            keys: state.keys.values().cloned().collect(),
            nodes: NodeResponse::from_table(&state.nodes),
            metrics: state.metrics.samples().cloned().collect(),
            pubsub: PubSubResponse::from_state(&state.pubsub),
        }
    }
}

/// Response body for DELETE /lru/keys/:key and DELETE /ttl/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' removed", key),
            key,
        }
    }
}

/// Plain acknowledgement for actions without a result value
#[derive(Debug, Clone, Serialize)]
pub struct AckResponse {
    pub message: String,
}

impl AckResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
