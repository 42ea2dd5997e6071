//! Inbound Dispatch
//!
//! Routes decoded push messages to store actions. Nothing here can end the
//! connection: bad frames and rejected actions are logged and dropped.

use chrono::Utc;
use tracing::{debug, warn};

use crate::push::messages::{decode, Decoded, InboundMessage, LruUpdate, TtlUpdate};
use crate::store::Store;

/// What happened to one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    /// The store rejected the event (e.g. duplicate TTL key)
    Rejected,
    UnknownType,
    Malformed,
}

/// Decodes a text frame and applies it to the store.
pub fn dispatch_frame(store: &Store, text: &str) -> DispatchOutcome {
    match decode(text) {
        Ok(Decoded::Message { message, timestamp }) => {
            debug!(tag = message.tag(), ?timestamp, "Inbound push message");
            dispatch(store, message, timestamp.unwrap_or_else(Utc::now))
        }
        Ok(Decoded::Unknown(tag)) => {
            warn!(tag = %tag, "Ignoring push message with unknown type");
            DispatchOutcome::UnknownType
        }
        Err(err) => {
            warn!(error = %err, "Dropping malformed push message");
            DispatchOutcome::Malformed
        }
    }
}

/// Applies one decoded message to the matching store action.
pub fn dispatch(store: &Store, message: InboundMessage, at: chrono::DateTime<Utc>) -> DispatchOutcome {
    let tag = message.tag();
    let result = match message {
        InboundMessage::KeyUpdate(update) => store.apply_key_update(update).map(drop),
        InboundMessage::TtlUpdate(TtlUpdate::Add { key, value, ttl_seconds }) => {
            store.ttl_add(&key, value, ttl_seconds)
        }
        InboundMessage::TtlUpdate(TtlUpdate::Remove { key }) => {
            store.ttl_remove(&key);
            Ok(())
        }
        InboundMessage::LruUpdate(LruUpdate::Touch { key, value }) => {
            store.lru_insert_or_touch(&key, value).map(drop)
        }
        InboundMessage::LruUpdate(LruUpdate::Delete { key }) => {
            store.lru_delete(&key);
            Ok(())
        }
        InboundMessage::LruUpdate(LruUpdate::Clear) => {
            store.lru_clear();
            Ok(())
        }
        InboundMessage::LruUpdate(LruUpdate::Capacity { capacity }) => {
            store.lru_set_capacity(capacity).map(drop)
        }
        InboundMessage::NodeUpdate(update) => store.apply_node_update(update).map(drop),
        InboundMessage::Metrics(sample) => {
            store.record_metrics(sample, at);
            Ok(())
        }
    };

    match result {
        Ok(()) => DispatchOutcome::Applied,
        Err(err) => {
            warn!(tag, error = %err, "Push message rejected by store");
            DispatchOutcome::Rejected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store() -> Store {
        Store::new(2, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_lru_frames_share_local_semantics() {
        let store = store();
        for key in ["a", "b", "c"] {
            let frame = format!(r#"{{"type":"lruUpdate","data":{{"action":"touch","key":"{}"}}}}"#, key);
            assert_eq!(dispatch_frame(&store, &frame), DispatchOutcome::Applied);
        }

        let state = store.get_state();
        assert_eq!(state.lru.keys(), vec!["c", "b"]);
        assert_eq!(state.lru.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_duplicate_ttl_is_rejected_not_fatal() {
        let store = store();
        let frame = r#"{"type":"ttlUpdate","data":{"action":"add","key":"k","value":"v","ttlSeconds":10}}"#;
        assert_eq!(dispatch_frame(&store, frame), DispatchOutcome::Applied);
        assert_eq!(dispatch_frame(&store, frame), DispatchOutcome::Rejected);
        assert_eq!(store.get_state().ttl.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_leave_state() {
        let store = store();
        let before = store.get_state();

        assert_eq!(
            dispatch_frame(&store, r#"{"type":"mystery","data":1}"#),
            DispatchOutcome::UnknownType
        );
        assert_eq!(dispatch_frame(&store, "{oops"), DispatchOutcome::Malformed);

        assert_eq!(*store.get_state(), *before);
    }

    #[tokio::test]
    async fn test_metrics_and_nodes() {
        let store = store();
        let metrics = r#"{"type":"metrics","data":{"opsPerSec":1200.5,"usedMemoryBytes":1048576,"connectedClients":7,"keyspaceHits":90,"keyspaceMisses":10},"timestamp":"2024-05-01T10:00:00Z"}"#;
        let node = r#"{"type":"nodeUpdate","data":{"id":"n1","address":"10.0.0.1:6379","role":"primary","status":"online"}}"#;
        let key = r#"{"type":"keyUpdate","data":{"key":"user:1","valueType":"hash"}}"#;

        assert_eq!(dispatch_frame(&store, metrics), DispatchOutcome::Applied);
        assert_eq!(dispatch_frame(&store, node), DispatchOutcome::Applied);
        assert_eq!(dispatch_frame(&store, key), DispatchOutcome::Applied);

        let state = store.get_state();
        let latest = state.metrics.latest().unwrap();
        assert_eq!(latest.sample.connected_clients, 7);
        assert!((latest.sample.hit_ratio() - 0.9).abs() < 1e-9);
        assert_eq!(latest.at.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert!(state.nodes.contains_key("n1"));
        assert_eq!(state.keys["user:1"].value_type, "hash");
    }
}
