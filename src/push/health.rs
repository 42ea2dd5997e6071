//! Collector Health Probe
//!
//! Used by the fallback poller while the push channel is disabled.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

#[async_trait]
pub trait HealthCheck: Send + Sync + 'static {
    /// `true` when the collector answered with a success status.
    async fn is_reachable(&self) -> bool;
}

/// Plain HTTP GET against the collector's health endpoint.
#[derive(Debug, Clone)]
pub struct HttpHealthCheck {
    client: reqwest::Client,
    url: String,
}

impl HttpHealthCheck {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl HealthCheck for HttpHealthCheck {
    async fn is_reachable(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(url = %self.url, error = %err, "Health poll failed");
                false
            }
        }
    }
}
