//! Search API client
//!
//! This module issues a single page request and owns the retry loop around it:
//! - 2xx returns the parsed page
//! - 429 waits for `Retry-After` (or the default backoff) and rotates the key
//! - 5xx and transport errors wait the backoff and retry the same key
//! - anything else aborts the query
//!
//! Every retryable failure counts toward exhaustion; once the consecutive
//! failures for one page exceed the pool size the request fails for good.

use crate::config::SearchConfig;
use crate::search::cursor::SearchCursor;
use crate::search::types::SearchResponse;
use crate::state::CredentialRotator;
use crate::HarvestError;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

/// Header carrying the API credential
const API_KEY_HEADER: &str = "API-Key";

/// How a single response is handled by the retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    /// Wait, rotate the credential, retry
    RateLimited { retry_after: Option<u64> },
    /// Wait, retry with the same credential
    ServerError,
    /// Abort the query
    Fatal,
}

impl ResponseClass {
    /// Classifies a status code plus the raw `Retry-After` header
    pub fn from_status(status: StatusCode, retry_after: Option<&str>) -> Self {
        if status.is_success() {
            Self::Success
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited {
                retry_after: retry_after.and_then(|v| v.trim().parse().ok()),
            }
        } else if status.is_server_error() {
            Self::ServerError
        } else {
            Self::Fatal
        }
    }
}

/// Search API client bound to one credential pool
pub struct SearchClient {
    http: Client,
    api_url: Url,
    rotator: CredentialRotator,
    backoff: Duration,
}

impl SearchClient {
    /// Builds a client from the search configuration
    pub fn from_config(config: &SearchConfig) -> Result<Self, HarvestError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            http,
            api_url: Url::parse(&config.api_url)?,
            rotator: CredentialRotator::new(&config.api_keys)?,
            backoff: Duration::from_secs(config.backoff_secs),
        })
    }

    /// Fetches one page, retrying transient failures
    ///
    /// # Arguments
    ///
    /// * `query` - Search query text
    /// * `size` - Requested page size
    /// * `cursor` - Resume position; `None` starts from the newest results
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - The parsed page
    /// * `Err(HarvestError::Api)` - A non-retryable status such as 400 or 403
    /// * `Err(HarvestError::CredentialsExhausted)` - Too many consecutive failures
    pub async fn fetch_page(
        &mut self,
        query: &str,
        size: u32,
        cursor: Option<&SearchCursor>,
    ) -> Result<SearchResponse, HarvestError> {
        let mut params = vec![("q", query.to_string()), ("size", size.to_string())];
        if let Some(cursor) = cursor {
            params.push(("search_after", cursor.to_param()));
        }

        let limit = self.rotator.len() as u32;
        let mut failures: u32 = 0;

        loop {
            let sent = self
                .http
                .get(self.api_url.clone())
                .header(API_KEY_HEADER, self.rotator.current())
                .header(ACCEPT, "application/json")
                .query(&params)
                .send()
                .await;

            let (wait, rotate) = match sent {
                Ok(response) => {
                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    let status = response.status();

                    match ResponseClass::from_status(status, retry_after.as_deref()) {
                        ResponseClass::Success => return self.parse_page(response).await,
                        ResponseClass::RateLimited { retry_after } => {
                            let wait = retry_after.map(Duration::from_secs).unwrap_or(self.backoff);
                            tracing::warn!(
                                "Rate limited on key #{}; waiting {:?} before rotating",
                                self.rotator.index() + 1,
                                wait
                            );
                            (wait, true)
                        }
                        ResponseClass::ServerError => {
                            tracing::warn!(
                                "Server error ({}); retrying after {:?}",
                                status.as_u16(),
                                self.backoff
                            );
                            (self.backoff, false)
                        }
                        ResponseClass::Fatal => {
                            let body = response.text().await.unwrap_or_default();
                            tracing::error!(
                                "Search API returned HTTP {}: {}",
                                status.as_u16(),
                                body
                            );
                            return Err(HarvestError::Api {
                                status: status.as_u16(),
                                body,
                            });
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Network error: {}; retrying after {:?}", e, self.backoff);
                    (self.backoff, false)
                }
            };

            failures += 1;
            if failures > limit {
                tracing::error!("All {} API keys failed for query {:?}", limit, query);
                return Err(HarvestError::CredentialsExhausted { attempts: failures });
            }

            tokio::time::sleep(wait).await;
            if rotate {
                self.rotator.rotate();
            }
        }
    }

    async fn parse_page(&self, response: Response) -> Result<SearchResponse, HarvestError> {
        let url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|source| HarvestError::Http { url, source })?;
        Ok(serde_json::from_str(&body)?)
    }
}
