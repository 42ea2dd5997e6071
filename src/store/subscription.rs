//! Store Subscriptions
//!
//! Synchronous slice observers and their async counterpart.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::store::DashboardState;

/// Handle returned by `Store::subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

pub(crate) trait Observer: Send + Sync {
    fn id(&self) -> SubscriptionId;
    fn notify(&self, state: &DashboardState);
}

/// Observer that fires only when its selected slice changes value.
pub(crate) struct SliceObserver<T, S, C> {
    id: SubscriptionId,
    selector: S,
    callback: C,
    last: Mutex<T>,
}

impl<T, S, C> SliceObserver<T, S, C>
where
    S: Fn(&DashboardState) -> T,
{
    pub(crate) fn new(id: SubscriptionId, state: &DashboardState, selector: S, callback: C) -> Self {
        let last = Mutex::new(selector(state));
        Self {
            id,
            selector,
            callback,
            last,
        }
    }
}

impl<T, S, C> Observer for SliceObserver<T, S, C>
where
    T: PartialEq + Clone + Send,
    S: Fn(&DashboardState) -> T + Send + Sync,
    C: Fn(&T) + Send + Sync,
{
    fn id(&self) -> SubscriptionId {
        self.id
    }

    fn notify(&self, state: &DashboardState) {
        let next = (self.selector)(state);
        {
            let mut last = self.last.lock();
            if *last == next {
                return;
            }
            *last = next.clone();
        }
        // Lock released: the callback may dispatch further actions.
        (self.callback)(&next);
    }
}

// == Slice Watcher ==
/// Async view of one slice; `changed` resolves on the next distinct value.
pub struct SliceWatcher<T, S> {
    rx: watch::Receiver<Arc<DashboardState>>,
    selector: S,
    last: T,
}

impl<T, S> SliceWatcher<T, S>
where
    T: PartialEq + Clone,
    S: Fn(&DashboardState) -> T,
{
    pub(crate) fn new(mut rx: watch::Receiver<Arc<DashboardState>>, selector: S) -> Self {
        let last = {
            let state = rx.borrow_and_update();
            selector(&**state)
        };
        Self { rx, selector, last }
    }

    /// Current slice value.
    pub fn current(&self) -> &T {
        &self.last
    }

    /// Waits for the slice to change. Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<T> {
        loop {
            self.rx.changed().await.ok()?;
            let next = {
                let state = self.rx.borrow_and_update();
                (self.selector)(&**state)
            };
            if next != self.last {
                self.last = next.clone();
                return Some(next);
            }
        }
    }

    /// Waits until the slice satisfies `predicate`, returning that value.
    pub async fn wait_for(&mut self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        if predicate(&self.last) {
            return Some(self.last.clone());
        }
        loop {
            let next = self.changed().await?;
            if predicate(&next) {
                return Some(next);
            }
        }
    }
}
