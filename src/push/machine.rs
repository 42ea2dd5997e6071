//! Reconnect State Machine
//!
//! Pure bookkeeping of the push client's lifecycle. The async driver in
//! `client.rs` performs the I/O and feeds events in here.

use std::time::Duration;

use crate::config::Config;
use crate::store::ConnectionState;

// == Backoff ==
/// Delay before reconnect attempt `attempt + 1`: `min(base * 2^attempt, cap)`.
pub fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    2u32.checked_pow(attempt)
        .and_then(|factor| base.checked_mul(factor))
        .map_or(cap, |delay| delay.min(cap))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl ReconnectPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_reconnect_attempts,
            base: config.backoff_base(),
            cap: config.backoff_cap(),
        }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        backoff_delay(attempt, self.base, self.cap)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What the driver should do after a failed or closed channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Wait `delay`, then call `on_retry_elapsed` and connect again
    Retry { delay: Duration },
    /// Attempts exhausted; switch to fallback polling
    Disable,
}

// == Connection Machine ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionMachine {
    policy: ReconnectPolicy,
    state: ConnectionState,
    attempts: u32,
}

impl ConnectionMachine {
    /// Starts in `Connecting`: the client opens the channel immediately.
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Connecting,
            attempts: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn on_open(&mut self) {
        self.state = ConnectionState::Connected;
        self.attempts = 0;
    }

    /// A connect attempt failed or an open channel closed.
    pub fn on_failure(&mut self) -> FailureAction {
        if self.attempts < self.policy.max_attempts {
            self.state = ConnectionState::Reconnecting;
            FailureAction::Retry {
                delay: self.policy.delay(self.attempts),
            }
        } else {
            self.state = ConnectionState::Disabled;
            FailureAction::Disable
        }
    }

    /// The scheduled retry fired.
    pub fn on_retry_elapsed(&mut self) {
        self.attempts += 1;
        self.state = ConnectionState::Connecting;
    }

    /// Explicit reconnect request: fresh counter, straight to `Connecting`.
    pub fn restart(&mut self) {
        self.attempts = 0;
        self.state = ConnectionState::Connecting;
    }

    /// Explicit disconnect: leaves the reconnect cycle.
    pub fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Disabled or disconnected: nothing happens until a reconnect request.
    pub fn is_idle(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::Disabled | ConnectionState::Disconnected
        )
    }
}
