//! Request DTOs for the dashboard API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

/// Longest key accepted over HTTP.
pub const MAX_KEY_LEN: usize = 256;

fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LEN {
        return Some(format!(
            "Key exceeds maximum length of {} characters",
            MAX_KEY_LEN
        ));
    }
    None
}

/// Request body for inserting or touching an LRU key (PUT /lru)
#[derive(Debug, Clone, Deserialize)]
pub struct LruTouchRequest {
    pub key: String,
    /// Replaces the stored payload when present
    #[serde(default)]
    pub value: Option<String>,
}

impl LruTouchRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Request body for PUT /lru/capacity
#[derive(Debug, Clone, Deserialize)]
pub struct CapacityRequest {
    pub capacity: usize,
}

/// Request body for tracking a key in the TTL simulator (PUT /ttl)
#[derive(Debug, Clone, Deserialize)]
pub struct TtlAddRequest {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub ttl_seconds: u64,
}

impl TtlAddRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Request body for POST /pubsub/:channel/publish
#[derive(Debug, Clone, Deserialize)]
pub struct PublishRequest {
    pub payload: String,
}

/// Request body for POST /connection/send
///
/// Forwarded to the collector as a push frame of the given type.
#[derive(Debug, Clone, Deserialize)]
pub struct SendRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl SendRequest {
    pub fn validate(&self) -> Option<String> {
        if self.kind.is_empty() {
            return Some("Message type cannot be empty".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_request_value_optional() {
        let req: LruTouchRequest = serde_json::from_str(r#"{"key": "a"}"#).unwrap();
        assert_eq!(req.key, "a");
        assert!(req.value.is_none());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_empty_key() {
        let req = LruTouchRequest {
            key: "".to_string(),
            value: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_long_key() {
        let req = TtlAddRequest {
            key: "k".repeat(MAX_KEY_LEN + 1),
            value: String::new(),
            ttl_seconds: 5,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_ttl_request_deserialize() {
        let json = r#"{"key": "session", "value": "abc", "ttl_seconds": 30}"#;
        let req: TtlAddRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "session");
        assert_eq!(req.ttl_seconds, 30);
    }

    #[test]
    fn test_send_request_type_field() {
        let json = r#"{"type": "ping", "data": {"n": 1}}"#;
        let req: SendRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.kind, "ping");
        assert_eq!(req.data["n"], 1);
        assert!(req.validate().is_none());
    }
}
