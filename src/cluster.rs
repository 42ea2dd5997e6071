//! Cluster Module
//!
//! Keyspace inventory, node table and metrics history fed by the collector.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

// == Keyspace ==

/// A key reported by the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyUpdate {
    pub key: String,
    #[serde(default)]
    pub value_type: Option<String>,
    /// Seconds to live as reported by the store, if any
    #[serde(default)]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    pub key: String,
    pub value_type: String,
    pub ttl_seconds: Option<i64>,
    pub size_bytes: Option<u64>,
    pub updated_at: DateTime<Utc>,
}

/// Keys by name.
pub type Keyspace = BTreeMap<String, KeyInfo>;

/// Upserts or removes a key. Returns `false` when a deletion found nothing.
pub fn apply_key_update(keys: &mut Keyspace, update: KeyUpdate, now: DateTime<Utc>) -> Result<bool> {
    if update.key.is_empty() {
        return Err(SimError::validation("Key cannot be empty"));
    }
    if update.deleted {
        return Ok(keys.remove(&update.key).is_some());
    }

    let info = KeyInfo {
        value_type: update.value_type.unwrap_or_else(|| "string".to_string()),
        ttl_seconds: update.ttl.filter(|ttl| *ttl >= 0),
        size_bytes: update.size,
        updated_at: now,
        key: update.key.clone(),
    };
    keys.insert(update.key, info);
    Ok(true)
}

// == Cluster Nodes ==

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Primary,
    Replica,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Offline,
    Syncing,
}

/// Node state as reported by the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    pub id: String,
    pub address: String,
    pub role: NodeRole,
    pub status: NodeStatus,
    #[serde(default)]
    pub primary_id: Option<String>,
    #[serde(default)]
    pub replication_offset: u64,
    #[serde(default)]
    pub lag_ms: u64,
    #[serde(default)]
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterNode {
    pub id: String,
    pub address: String,
    pub role: NodeRole,
    pub status: NodeStatus,
    pub primary_id: Option<String>,
    pub replication_offset: u64,
    pub lag_ms: u64,
    pub updated_at: DateTime<Utc>,
}

/// Nodes by id.
pub type NodeTable = BTreeMap<String, ClusterNode>;

/// Upserts or removes a node. Returns `false` when a removal found nothing.
pub fn apply_node_update(nodes: &mut NodeTable, update: NodeUpdate, now: DateTime<Utc>) -> Result<bool> {
    if update.id.is_empty() {
        return Err(SimError::validation("Node id cannot be empty"));
    }
    if update.removed {
        return Ok(nodes.remove(&update.id).is_some());
    }
    if update.role == NodeRole::Replica && update.primary_id.as_deref() == Some(update.id.as_str()) {
        return Err(SimError::validation(format!(
            "Replica '{}' cannot replicate from itself",
            update.id
        )));
    }

    let node = ClusterNode {
        id: update.id.clone(),
        address: update.address,
        role: update.role,
        status: update.status,
        primary_id: update.primary_id,
        replication_offset: update.replication_offset,
        lag_ms: update.lag_ms,
        updated_at: now,
    };
    nodes.insert(update.id, node);
    Ok(true)
}

/// Replicas following `primary_id`.
pub fn replicas_of<'a>(nodes: &'a NodeTable, primary_id: &'a str) -> impl Iterator<Item = &'a ClusterNode> {
    nodes
        .values()
        .filter(move |n| n.role == NodeRole::Replica && n.primary_id.as_deref() == Some(primary_id))
}

// == Metrics ==

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSample {
    #[serde(default)]
    pub ops_per_sec: f64,
    #[serde(default)]
    pub used_memory_bytes: u64,
    #[serde(default)]
    pub connected_clients: u64,
    #[serde(default)]
    pub keyspace_hits: u64,
    #[serde(default)]
    pub keyspace_misses: u64,
}

impl MetricsSample {
    /// Keyspace hit ratio, 0 when nothing was looked up.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.keyspace_hits + self.keyspace_misses;
        if total == 0 {
            0.0
        } else {
            self.keyspace_hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedSample {
    pub at: DateTime<Utc>,
    pub sample: MetricsSample,
}

/// Bounded ring of samples for charts, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsHistory {
    limit: usize,
    samples: VecDeque<TimedSample>,
}

impl MetricsHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            samples: VecDeque::new(),
        }
    }

    pub fn record(&mut self, sample: MetricsSample, at: DateTime<Utc>) {
        self.samples.push_back(TimedSample { at, sample });
        while self.samples.len() > self.limit {
            self.samples.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&TimedSample> {
        self.samples.back()
    }

    pub fn samples(&self) -> impl Iterator<Item = &TimedSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
