//! HTTP liveness probe
//!
//! HEAD first; anything outside 200..400 is retried once with GET. Redirects
//! are followed by the client.

use crate::config::ProbeConfig;
use crate::probe::{Probe, ProbeOutcome};
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Returns true for statuses that count as reachable (200..400)
pub fn is_reachable_status(status: u16) -> bool {
    (200..400).contains(&status)
}

/// Probe backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    /// Builds a probe with its own client
    ///
    /// # Arguments
    ///
    /// * `timeout` - Whole-request timeout for each HEAD or GET
    /// * `user_agent` - User-Agent header value
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, HarvestError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(Policy::limited(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }

    pub fn from_config(config: &ProbeConfig) -> Result<Self, HarvestError> {
        Self::new(Duration::from_secs(config.timeout_secs), &config.user_agent)
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let head = match self.client.head(url).send().await {
            Ok(response) => response.status().as_u16(),
            Err(e) => {
                tracing::debug!("HEAD {} failed: {}", url, e);
                return ProbeOutcome::unreachable();
            }
        };

        if is_reachable_status(head) {
            return ProbeOutcome::from_status(head);
        }

        match self.client.get(url).send().await {
            Ok(response) => ProbeOutcome::from_status(response.status().as_u16()),
            Err(e) => {
                tracing::debug!("GET {} failed: {}", url, e);
                ProbeOutcome::unreachable()
            }
        }
    }
}
