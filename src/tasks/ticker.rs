//! TTL Ticker
//!
//! Background task that drives the TTL simulator's clock.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::Store;

/// Spawns a task that ticks the TTL simulator every `interval`.
///
/// Each tick evaluates every tracked key against the current time; expired
/// keys are removed from the store and announced with a notification.
/// Abort the returned handle to stop it.
///
/// # Example
/// ```ignore
/// let store = Store::new(5, Duration::from_secs(2))?;
/// let ticker = spawn_ttl_ticker(store.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// ticker.abort();
/// ```
pub fn spawn_ttl_ticker(store: Store, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting TTL ticker");

        loop {
            tokio::time::sleep(interval).await;

            if store.get_state().ttl.is_empty() {
                continue;
            }

            let expired = store.ttl_tick(Utc::now());
            if expired.is_empty() {
                debug!("TTL tick: nothing expired");
            } else {
                info!("TTL tick: expired {} keys", expired.len());
            }
        }
    })
}
