//! Configuration Module
//!
//! Handles loading the static configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, SimError};

/// Runtime configuration, read once at startup.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Collector base address (HTTP)
    pub api_url: String,
    /// Push-channel address, derived from `api_url` when unset
    pub ws_url: String,
    /// Capacity of the LRU simulator at startup
    pub default_lru_capacity: usize,
    /// Reconnect attempts before the push client is disabled
    pub max_reconnect_attempts: u32,
    /// First reconnect delay in milliseconds
    pub backoff_base_ms: u64,
    /// Upper bound for any single reconnect delay in milliseconds
    pub backoff_cap_ms: u64,
    /// Display window of a notification in milliseconds
    pub notification_ttl_ms: u64,
    /// TTL simulator tick cadence in milliseconds
    pub ttl_tick_ms: u64,
    /// Health poll interval while the push channel is disabled
    pub health_poll_interval_ms: u64,
    /// Number of metrics samples kept for charts
    pub metrics_history_len: usize,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `COLLECTOR_API_URL` - Collector base address (default: http://localhost:3001)
    /// - `COLLECTOR_WS_URL` - Push-channel address (default: derived from the API url)
    /// - `DEFAULT_LRU_CAPACITY` - LRU capacity (default: 5)
    /// - `MAX_RECONNECT_ATTEMPTS` - Reconnect attempts (default: 5)
    /// - `BACKOFF_BASE_MS` / `BACKOFF_CAP_MS` - Backoff bounds (default: 1000 / 30000)
    /// - `NOTIFICATION_TTL_MS` - Notification window (default: 2000)
    /// - `TTL_TICK_MS` - TTL tick cadence (default: 1000)
    /// - `HEALTH_POLL_MS` - Fallback poll interval (default: 10000)
    /// - `METRICS_HISTORY_LEN` - Metrics samples kept (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_url = env::var("COLLECTOR_API_URL").unwrap_or(defaults.api_url);
        let ws_url = env::var("COLLECTOR_WS_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| derive_ws_url(&api_url));

        Self {
            api_url,
            ws_url,
            default_lru_capacity: env_or("DEFAULT_LRU_CAPACITY", defaults.default_lru_capacity),
            max_reconnect_attempts: env_or("MAX_RECONNECT_ATTEMPTS", defaults.max_reconnect_attempts),
            backoff_base_ms: env_or("BACKOFF_BASE_MS", defaults.backoff_base_ms),
            backoff_cap_ms: env_or("BACKOFF_CAP_MS", defaults.backoff_cap_ms),
            notification_ttl_ms: env_or("NOTIFICATION_TTL_MS", defaults.notification_ttl_ms),
            ttl_tick_ms: env_or("TTL_TICK_MS", defaults.ttl_tick_ms),
            health_poll_interval_ms: env_or("HEALTH_POLL_MS", defaults.health_poll_interval_ms),
            metrics_history_len: env_or("METRICS_HISTORY_LEN", defaults.metrics_history_len),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    /// Rejects values the simulators cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.default_lru_capacity < 1 {
            return Err(SimError::validation("LRU capacity must be at least 1"));
        }
        if self.backoff_base_ms == 0 || self.backoff_cap_ms < self.backoff_base_ms {
            return Err(SimError::validation(
                "Backoff base must be positive and not exceed the cap",
            ));
        }
        if self.ttl_tick_ms == 0 || self.health_poll_interval_ms == 0 {
            return Err(SimError::validation("Intervals must be positive"));
        }
        if !self.ws_url.starts_with("ws://") && !self.ws_url.starts_with("wss://") {
            return Err(SimError::validation(format!(
                "Push channel url must use ws:// or wss://, got {}",
                self.ws_url
            )));
        }
        Ok(())
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    pub fn ttl_tick(&self) -> Duration {
        Duration::from_millis(self.ttl_tick_ms)
    }

    pub fn health_poll_interval(&self) -> Duration {
        Duration::from_millis(self.health_poll_interval_ms)
    }

    /// Health endpoint polled while the push channel is disabled.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.api_url.trim_end_matches('/'))
    }
}

impl Default for Config {
    fn default() -> Self {
        let api_url = "http://localhost:3001".to_string();
        Self {
            ws_url: derive_ws_url(&api_url),
            api_url,
            default_lru_capacity: 5,
            max_reconnect_attempts: 5,
            backoff_base_ms: 1000,
            backoff_cap_ms: 30_000,
            notification_ttl_ms: 2000,
            ttl_tick_ms: 1000,
            health_poll_interval_ms: 10_000,
            metrics_history_len: 60,
            server_port: 3000,
        }
    }
}

/// Upgrades the collector's HTTP address to the push-channel address on the same host.
pub fn derive_ws_url(api_url: &str) -> String {
    let trimmed = api_url.trim_end_matches('/');
    if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        format!("ws://{}", trimmed)
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:3001");
        assert_eq!(config.ws_url, "ws://localhost:3001");
        assert_eq!(config.default_lru_capacity, 5);
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.backoff_base_ms, 1000);
        assert_eq!(config.backoff_cap_ms, 30_000);
        assert_eq!(config.notification_ttl_ms, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("COLLECTOR_API_URL");
        env::remove_var("COLLECTOR_WS_URL");
        env::remove_var("DEFAULT_LRU_CAPACITY");
        env::remove_var("MAX_RECONNECT_ATTEMPTS");

        let config = Config::from_env();
        assert_eq!(config.ws_url, "ws://localhost:3001");
        assert_eq!(config.default_lru_capacity, 5);
        assert_eq!(config.max_reconnect_attempts, 5);
    }

    #[test]
    fn test_derive_ws_url() {
        assert_eq!(derive_ws_url("http://collector:8080"), "ws://collector:8080");
        assert_eq!(derive_ws_url("https://collector.example/"), "wss://collector.example");
        assert_eq!(derive_ws_url("collector:8080"), "ws://collector:8080");
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = Config {
            default_lru_capacity: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(SimError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_http_ws_url() {
        let config = Config {
            ws_url: "http://localhost:3001".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_derived_wss_url() {
        let config = Config {
            api_url: "https://collector.example".to_string(),
            ws_url: derive_ws_url("https://collector.example"),
            ..Config::default()
        };
        assert_eq!(config.ws_url, "wss://collector.example");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_health_url() {
        let config = Config {
            api_url: "http://collector:8080/".to_string(),
            ..Config::default()
        };
        assert_eq!(config.health_url(), "http://collector:8080/health");
    }
}
