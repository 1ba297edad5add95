// BookFlow - Personal Reading Tracker
// Copyright (C) 2025 BookFlow contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Shared HTTP plumbing for the metadata search providers
//!
//! All three providers are public, unauthenticated, read-only APIs, so the
//! client here is deliberately small:
//! - one pooled `reqwest::Client` with rustls
//! - retry with exponential backoff on transient failures (connect errors,
//!   5xx, 429)
//! - a semaphore capping concurrent requests across providers
//! - JSON responses only

use crate::error::{BookFlowError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Requests in flight at once, across all providers
pub const MAX_CONCURRENCY: usize = 4;

/// Total attempts per request (one initial, two retries)
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// First backoff step; doubles per attempt (1s, 2s, 4s)
const INITIAL_RETRY_DELAY_SECS: u64 = 1;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tunables for [`SearchClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: MAX_RETRY_ATTEMPTS,
            user_agent: "BookFlow/0.1 (personal reading tracker)".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }
}

/// Fluent construction for [`ClientConfig`]
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client shared by the search providers
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    config: ClientConfig,
    semaphore: Arc<Semaphore>,
}

impl SearchClient {
    /// Client with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| BookFlowError::InvalidInput(format!("Invalid user agent: {}", e)))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            config,
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENCY)),
        })
    }

    /// GET a URL and decode the JSON body
    ///
    /// Retries transient failures with exponential backoff. Non-transient
    /// HTTP errors (4xx other than 429) fail immediately.
    pub async fn get_json(&self, url: &str, provider: &str) -> Result<serde_json::Value> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| BookFlowError::Cancelled)?;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let body = response.json::<serde_json::Value>().await.map_err(|e| {
                            BookFlowError::InvalidSearchResponse {
                                message: e.to_string(),
                                provider: provider.to_string(),
                            }
                        })?;
                        return Ok(body);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(INITIAL_RETRY_DELAY_SECS << attempt);

                        if attempt >= self.config.max_retries {
                            return Err(BookFlowError::RateLimitExceeded {
                                retry_after_seconds: retry_after,
                                provider: provider.to_string(),
                            });
                        }
                        warn!(provider, attempt, retry_after, "rate limited, backing off");
                        sleep(Duration::from_secs(retry_after)).await;
                        continue;
                    }

                    if status.is_server_error() && attempt < self.config.max_retries {
                        let delay = INITIAL_RETRY_DELAY_SECS << (attempt - 1);
                        debug!(provider, attempt, %status, delay, "server error, retrying");
                        sleep(Duration::from_secs(delay)).await;
                        continue;
                    }

                    return Err(BookFlowError::search_failed(
                        format!("HTTP {}", status),
                        Some(status.as_u16()),
                        Some(provider.to_string()),
                    ));
                }
                Err(e) => {
                    let transient = e.is_timeout() || e.is_connect();
                    if transient && attempt < self.config.max_retries {
                        let delay = INITIAL_RETRY_DELAY_SECS << (attempt - 1);
                        debug!(provider, attempt, delay, error = %e, "request failed, retrying");
                        sleep(Duration::from_secs(delay)).await;
                        continue;
                    }
                    return Err(BookFlowError::network_error(e.to_string(), transient));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::builder()
            .timeout(Duration::from_secs(5))
            .max_retries(1)
            .user_agent("test-agent")
            .build();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn test_client_builds_with_defaults() {
        let client = SearchClient::new();
        assert!(client.is_ok());
    }
}
