//! Store Actions
//!
//! The named mutations of the dashboard state, one group per entity family.

use std::convert::Infallible;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::cluster::{self, KeyUpdate, MetricsSample, NodeUpdate};
use crate::error::Result;
use crate::lru::TouchOutcome;
use crate::notifications::{NewNotification, NotificationId};
use crate::store::{ConnectionState, DashboardState, Inner, Store};
use crate::ttl::TtlEntry;

impl Store {
    /// Commits a transition that cannot fail.
    fn update<R>(&self, transition: impl FnOnce(&mut DashboardState) -> R) -> R {
        match self.apply(|state| Ok::<R, Infallible>(transition(state))) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    // == LRU ==

    /// Touches or inserts `key`; one warning notification per evicted key.
    pub fn lru_insert_or_touch(&self, key: &str, value: Option<String>) -> Result<TouchOutcome> {
        let outcome = self.apply(|s| s.lru.insert_or_touch(key, value, Utc::now()))?;
        debug!(key, hit = outcome.hit, "LRU touch");
        self.announce_evictions(&outcome.evicted);
        Ok(outcome)
    }

    /// Moves a present key to the front. Absent keys are rejected with `NotFound`.
    pub fn lru_access(&self, key: &str) -> Result<()> {
        self.apply(|s| s.lru.access(key, Utc::now()))?;
        self.notify(NewNotification::info(
            "Cache hit",
            format!("'{}' moved to the front of the cache", key),
        ));
        Ok(())
    }

    pub fn lru_delete(&self, key: &str) -> bool {
        self.update(|s| s.lru.delete(key))
    }

    /// Empties the cache; hit, miss and eviction counters are kept.
    pub fn lru_clear(&self) {
        self.update(|s| s.lru.clear());
    }

    pub fn lru_set_capacity(&self, capacity: usize) -> Result<Vec<String>> {
        let evicted = self.apply(|s| s.lru.set_capacity(capacity))?;
        info!(capacity, evicted = evicted.len(), "LRU capacity changed");
        self.announce_evictions(&evicted);
        Ok(evicted)
    }

    pub fn lru_reset_stats(&self) {
        self.update(|s| s.lru.reset_stats());
    }

    fn announce_evictions(&self, evicted: &[String]) {
        for key in evicted {
            info!(key = %key, "Evicted least recently used key");
            self.notify(NewNotification::warning(
                "Key evicted",
                format!("'{}' was evicted as the least recently used entry", key),
            ));
        }
    }

    // == TTL ==

    pub fn ttl_add(&self, key: &str, value: impl Into<String>, ttl_seconds: u64) -> Result<()> {
        self.ttl_add_at(key, value, ttl_seconds, Utc::now())
    }

    /// `ttl_add` with an explicit start time.
    pub fn ttl_add_at(
        &self,
        key: &str,
        value: impl Into<String>,
        ttl_seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let value = value.into();
        self.apply(|s| s.ttl.add(key, value, ttl_seconds, now))
    }

    pub fn ttl_remove(&self, key: &str) -> bool {
        self.update(|s| s.ttl.remove(key).is_some())
    }

    /// Expires every entry whose countdown reached zero at `now`.
    pub fn ttl_tick(&self, now: DateTime<Utc>) -> Vec<TtlEntry> {
        let expired = self.update(|s| s.ttl.tick(now));
        for entry in &expired {
            info!(key = %entry.key, ttl_seconds = entry.ttl_seconds, "TTL entry expired");
            self.notify(NewNotification::info(
                "Key expired",
                format!("'{}' expired after {}s", entry.key, entry.ttl_seconds),
            ));
        }
        expired
    }

    // == Notifications ==

    /// Publishes a notification and schedules its removal after the display window.
    pub fn notify(&self, notification: NewNotification) -> NotificationId {
        let id = self.update(|s| s.notifications.push(notification, Utc::now()));
        self.schedule_removal(id);
        id
    }

    /// Removes a notification now and cancels its pending removal.
    pub fn dismiss_notification(&self, id: NotificationId) -> bool {
        if let Some(timer) = self.inner.timers.lock().remove(&id) {
            timer.abort();
        }
        self.update(|s| s.notifications.remove(id))
    }

    /// Cancels every pending removal and empties the list.
    pub fn clear_notifications(&self) {
        let pending: Vec<_> = self.inner.timers.lock().drain().map(|(_, timer)| timer).collect();
        for timer in pending {
            timer.abort();
        }
        self.update(|s| s.notifications.clear());
    }

    pub fn mark_notification_read(&self, id: NotificationId) -> bool {
        self.update(|s| s.notifications.mark_read(id))
    }

    pub fn mark_all_notifications_read(&self) {
        self.update(|s| s.notifications.mark_all_read());
    }

    /// Number of removal timers still pending.
    pub fn pending_notification_timers(&self) -> usize {
        self.inner.timers.lock().len()
    }

    fn schedule_removal(&self, id: NotificationId) {
        let Some(runtime) = self.inner.runtime.as_ref() else {
            debug!(id, "No runtime for notification timer; kept until dismissed");
            return;
        };
        let window = self.inner.notification_ttl;
        let store = self.downgrade();

        // Held across spawn so the timer cannot look itself up before it is registered.
        let mut timers = self.inner.timers.lock();
        let timer = runtime.spawn(async move {
            tokio::time::sleep(window).await;
            if let Some(inner) = store.upgrade() {
                Store::from_inner(inner).expire_notification(id);
            }
        });
        if let Some(stale) = timers.insert(id, timer) {
            stale.abort();
        }
    }

    fn expire_notification(&self, id: NotificationId) {
        // Only a timer still registered for `id` may remove it.
        if self.inner.timers.lock().remove(&id).is_none() {
            return;
        }
        self.update(|s| s.notifications.remove(id));
    }

    // == Connection ==

    /// Records a state change of the push client.
    pub fn set_connection_state(&self, state: ConnectionState, attempts: u32) {
        self.update(|s| {
            s.connection.state = state;
            s.connection.attempts = attempts;
        });
    }

    /// Records a successful open: attempts reset, error cleared.
    pub fn mark_connected(&self, now: DateTime<Utc>) {
        self.update(|s| {
            s.connection.state = ConnectionState::Connected;
            s.connection.attempts = 0;
            s.connection.last_connected_at = Some(now);
            s.connection.last_error = None;
            s.connection.collector_reachable = Some(true);
        });
    }

    pub fn record_connection_error(&self, error: impl Into<String>) {
        let error = error.into();
        self.update(|s| s.connection.last_error = Some(error));
    }

    /// Stores the result of a fallback health poll.
    pub fn record_health(&self, reachable: bool, now: DateTime<Utc>) {
        self.update(|s| {
            s.connection.collector_reachable = Some(reachable);
            s.connection.last_polled_at = Some(now);
        });
    }

    // == Collector Slices ==

    pub fn apply_key_update(&self, update: KeyUpdate) -> Result<bool> {
        self.apply(|s| cluster::apply_key_update(&mut s.keys, update, Utc::now()))
    }

    pub fn apply_node_update(&self, update: NodeUpdate) -> Result<bool> {
        self.apply(|s| cluster::apply_node_update(&mut s.nodes, update, Utc::now()))
    }

    pub fn record_metrics(&self, sample: MetricsSample, at: DateTime<Utc>) {
        self.update(|s| s.metrics.record(sample, at));
    }

    // == Pub/Sub ==

    pub fn pubsub_subscribe(&self, channel: &str) -> Result<u32> {
        self.apply(|s| s.pubsub.subscribe(channel))
    }

    pub fn pubsub_unsubscribe(&self, channel: &str) -> Result<u32> {
        self.apply(|s| s.pubsub.unsubscribe(channel))
    }

    pub fn pubsub_publish(&self, channel: &str, payload: impl Into<String>) -> Result<u32> {
        let payload = payload.into();
        let delivered = self.apply(|s| s.pubsub.publish(channel, payload, Utc::now()))?;
        self.notify(NewNotification::info(
            "Message published",
            format!("'{}' delivered to {} subscriber(s)", channel, delivered),
        ));
        Ok(delivered)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        for (_, timer) in self.timers.get_mut().drain() {
            timer.abort();
        }
    }
}
