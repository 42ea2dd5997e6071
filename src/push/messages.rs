//! Push Messages
//!
//! Wire format of the collector's push channel: `{ type, data, timestamp }`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cluster::{KeyUpdate, MetricsSample, NodeUpdate};
use crate::error::ChannelError;

/// TTL events carried by `ttlUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TtlUpdate {
    #[serde(rename_all = "camelCase")]
    Add {
        key: String,
        #[serde(default)]
        value: String,
        ttl_seconds: u64,
    },
    Remove { key: String },
}

/// LRU events carried by `lruUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum LruUpdate {
    Touch {
        key: String,
        #[serde(default)]
        value: Option<String>,
    },
    Delete { key: String },
    Clear,
    Capacity { capacity: usize },
}

/// A decoded inbound message, one variant per routed tag.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    KeyUpdate(KeyUpdate),
    TtlUpdate(TtlUpdate),
    LruUpdate(LruUpdate),
    NodeUpdate(NodeUpdate),
    Metrics(MetricsSample),
}

impl InboundMessage {
    pub fn tag(&self) -> &'static str {
        match self {
            InboundMessage::KeyUpdate(_) => "keyUpdate",
            InboundMessage::TtlUpdate(_) => "ttlUpdate",
            InboundMessage::LruUpdate(_) => "lruUpdate",
            InboundMessage::NodeUpdate(_) => "nodeUpdate",
            InboundMessage::Metrics(_) => "metrics",
        }
    }
}

/// Result of decoding one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Message {
        message: InboundMessage,
        timestamp: Option<DateTime<Utc>>,
    },
    /// Well-formed frame with a tag this client does not route
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

// == Decode ==
/// Parses a text frame. Unknown tags are not errors; bad JSON or a payload
/// that does not fit its tag is `ChannelError::Malformed`.
pub fn decode(text: &str) -> Result<Decoded, ChannelError> {
    let envelope: Envelope = serde_json::from_str(text)?;
    let data = envelope.data;
    let message = match envelope.kind.as_str() {
        "keyUpdate" => InboundMessage::KeyUpdate(serde_json::from_value(data)?),
        "ttlUpdate" => InboundMessage::TtlUpdate(serde_json::from_value(data)?),
        "lruUpdate" => InboundMessage::LruUpdate(serde_json::from_value(data)?),
        "nodeUpdate" => InboundMessage::NodeUpdate(serde_json::from_value(data)?),
        "metrics" => InboundMessage::Metrics(serde_json::from_value(data)?),
        _ => return Ok(Decoded::Unknown(envelope.kind)),
    };
    Ok(Decoded::Message {
        message,
        timestamp: envelope.timestamp,
    })
}

// == Outbound ==
/// Frame sent to the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl OutboundMessage {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
            timestamp: Utc::now(),
        }
    }
}
