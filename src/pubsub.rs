//! Pub/Sub Module
//!
//! Simulated channels: subscriber counts and a bounded log of publishes.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Result, SimError};

/// Published messages kept for display.
pub const MESSAGE_LOG_LIMIT: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelInfo {
    pub subscribers: u32,
    pub messages_published: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedMessage {
    pub channel: String,
    pub payload: String,
    pub delivered_to: u32,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PubSubState {
    channels: BTreeMap<String, ChannelInfo>,
    log: VecDeque<PublishedMessage>,
}

impl PubSubState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber and returns the channel's new subscriber count.
    pub fn subscribe(&mut self, channel: &str) -> Result<u32> {
        validate_channel(channel)?;
        let info = self.channels.entry(channel.to_string()).or_default();
        info.subscribers += 1;
        Ok(info.subscribers)
    }

    /// Drops a subscriber; a channel with none left and no history disappears.
    pub fn unsubscribe(&mut self, channel: &str) -> Result<u32> {
        validate_channel(channel)?;
        let info = self
            .channels
            .get_mut(channel)
            .filter(|info| info.subscribers > 0)
            .ok_or_else(|| SimError::NotFound(channel.to_string()))?;
        info.subscribers -= 1;
        let remaining = info.subscribers;
        if remaining == 0 && info.messages_published == 0 {
            self.channels.remove(channel);
        }
        Ok(remaining)
    }

    /// Publishes to a channel; returns how many subscribers received it.
    pub fn publish(&mut self, channel: &str, payload: impl Into<String>, now: DateTime<Utc>) -> Result<u32> {
        validate_channel(channel)?;
        let info = self.channels.entry(channel.to_string()).or_default();
        info.messages_published += 1;
        let delivered_to = info.subscribers;

        self.log.push_front(PublishedMessage {
            channel: channel.to_string(),
            payload: payload.into(),
            delivered_to,
            published_at: now,
        });
        self.log.truncate(MESSAGE_LOG_LIMIT);
        Ok(delivered_to)
    }

    pub fn channels(&self) -> &BTreeMap<String, ChannelInfo> {
        &self.channels
    }

    /// Newest first.
    pub fn recent(&self) -> impl Iterator<Item = &PublishedMessage> {
        self.log.iter()
    }
}

fn validate_channel(channel: &str) -> Result<()> {
    if channel.is_empty() {
        return Err(SimError::validation("Channel name cannot be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_counts_subscribers() {
        let mut pubsub = PubSubState::new();
        pubsub.subscribe("news").unwrap();
        pubsub.subscribe("news").unwrap();

        assert_eq!(pubsub.publish("news", "hello", Utc::now()).unwrap(), 2);
        assert_eq!(pubsub.publish("empty", "nobody", Utc::now()).unwrap(), 0);

        let recent: Vec<&str> = pubsub.recent().map(|m| m.channel.as_str()).collect();
        assert_eq!(recent, vec!["empty", "news"]);
        assert_eq!(pubsub.channels()["news"].messages_published, 1);
    }

    #[test]
    fn test_unsubscribe_unknown_channel() {
        let mut pubsub = PubSubState::new();
        assert!(matches!(pubsub.unsubscribe("nope"), Err(SimError::NotFound(_))));
    }

    #[test]
    fn test_unsubscribe_removes_idle_channel() {
        let mut pubsub = PubSubState::new();
        pubsub.subscribe("c").unwrap();
        assert_eq!(pubsub.unsubscribe("c").unwrap(), 0);
        assert!(pubsub.channels().is_empty());
    }

    #[test]
    fn test_log_is_bounded() {
        let mut pubsub = PubSubState::new();
        for i in 0..(MESSAGE_LOG_LIMIT + 10) {
            pubsub.publish("c", i.to_string(), Utc::now()).unwrap();
        }
        assert_eq!(pubsub.recent().count(), MESSAGE_LOG_LIMIT);
        assert_eq!(pubsub.recent().next().unwrap().payload, (MESSAGE_LOG_LIMIT + 9).to_string());
    }

    #[test]
    fn test_empty_channel_rejected() {
        let mut pubsub = PubSubState::new();
        assert!(pubsub.subscribe("").is_err());
        assert!(pubsub.publish("", "x", Utc::now()).is_err());
    }
}
