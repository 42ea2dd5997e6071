//! Store Module
//!
//! The single observable source of truth. Every writer goes through the
//! action methods in `actions.rs`; readers take snapshots or subscribe.
//!
//! Each action computes the next state on a copy and commits it only when
//! the transition succeeds, so a rejected action leaves the state untouched.

mod actions;
mod state;
mod subscription;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::Result;
use crate::notifications::NotificationId;

pub use state::{ConnectionState, ConnectionStatus, DashboardState};
pub use subscription::{SliceWatcher, SubscriptionId};

use subscription::{Observer, SliceObserver};

/// Metrics samples kept when no configuration is supplied.
const DEFAULT_METRICS_HISTORY: usize = 60;

// == Store ==
/// Shared handle to the dashboard state. Cloning is cheap.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

struct Inner {
    /// Authoritative state; the lock also serializes actions
    state: Mutex<DashboardState>,
    /// Last committed snapshot, published for readers and watchers
    snapshots: watch::Sender<Arc<DashboardState>>,
    observers: Mutex<Vec<Arc<dyn Observer>>>,
    next_observer: AtomicU64,
    /// Pending auto-removal per notification
    timers: Mutex<HashMap<NotificationId, JoinHandle<()>>>,
    notification_ttl: Duration,
    runtime: Option<Handle>,
}

impl Store {
    // == Constructors ==
    /// Creates a store with an empty LRU of `lru_capacity` slots.
    ///
    /// Notification timers run on the tokio runtime current at construction;
    /// without one, notifications stay until dismissed or cleared.
    pub fn new(lru_capacity: usize, notification_ttl: Duration) -> Result<Self> {
        Self::build(lru_capacity, notification_ttl, DEFAULT_METRICS_HISTORY)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(
            config.default_lru_capacity,
            config.notification_ttl(),
            config.metrics_history_len,
        )
    }

    fn build(lru_capacity: usize, notification_ttl: Duration, metrics_history: usize) -> Result<Self> {
        let state = DashboardState::new(lru_capacity, metrics_history)?;
        let (snapshots, _) = watch::channel(Arc::new(state.clone()));
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                snapshots,
                observers: Mutex::new(Vec::new()),
                next_observer: AtomicU64::new(0),
                timers: Mutex::new(HashMap::new()),
                notification_ttl,
                runtime: Handle::try_current().ok(),
            }),
        })
    }

    // == Get State ==
    /// Snapshot of the last committed state.
    pub fn get_state(&self) -> Arc<DashboardState> {
        self.inner.snapshots.borrow().clone()
    }

    // == Subscribe ==
    /// Calls `callback` after any action that changes the selected slice.
    ///
    /// Slices are compared by value; the callback runs outside the store's
    /// locks and may dispatch further actions.
    pub fn subscribe<T, S, C>(&self, selector: S, callback: C) -> SubscriptionId
    where
        T: PartialEq + Clone + Send + 'static,
        S: Fn(&DashboardState) -> T + Send + Sync + 'static,
        C: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_observer.fetch_add(1, Ordering::Relaxed));
        let observer = SliceObserver::new(id, &self.get_state(), selector, callback);
        self.inner.observers.lock().push(Arc::new(observer));
        id
    }

    /// Removes an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.inner.observers.lock();
        let before = observers.len();
        observers.retain(|o| o.id() != id);
        observers.len() != before
    }

    /// Async watcher over one slice of the state.
    pub fn watch<T, S>(&self, selector: S) -> SliceWatcher<T, S>
    where
        T: PartialEq + Clone,
        S: Fn(&DashboardState) -> T,
    {
        SliceWatcher::new(self.inner.snapshots.subscribe(), selector)
    }

    // == Apply ==
    /// Runs one transition against a copy of the state and commits it on success.
    pub(crate) fn apply<R, E>(
        &self,
        transition: impl FnOnce(&mut DashboardState) -> std::result::Result<R, E>,
    ) -> std::result::Result<R, E> {
        let value = {
            let mut state = self.inner.state.lock();
            let mut next = state.clone();
            let value = transition(&mut next)?;
            if next == *state {
                return Ok(value);
            }
            let snapshot = Arc::new(next.clone());
            *state = next;
            self.inner.snapshots.send_replace(snapshot);
            value
        };

        self.notify_observers();
        Ok(value)
    }

    /// Delivers the latest committed state to every observer.
    ///
    /// An observer may dispatch an action mid-loop; observers after it then
    /// see that newer state, never the one this action committed.
    fn notify_observers(&self) {
        let observers: Vec<Arc<dyn Observer>> = self.inner.observers.lock().clone();
        for observer in observers {
            let latest = self.get_state();
            observer.notify(&latest);
        }
    }

    fn downgrade(&self) -> Weak<Inner> {
        Arc::downgrade(&self.inner)
    }

    fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.get_state())
            .finish()
    }
}
