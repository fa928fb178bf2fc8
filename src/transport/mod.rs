//! Outbound HTTP transport
//!
//! Wraps a reqwest client with header rotation, a per-request timeout and a
//! bounded retry budget with linearly increasing backoff.

mod request;

pub use request::Request;

use rand::random_range;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request to {url} failed after {attempts} attempts: {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

/// Transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per request before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff; attempt `n` waits `n * retry_delay_ms` before retrying
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// User agents rotated on every attempt
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    5000
}
fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            user_agents: default_user_agents(),
        }
    }
}

/// HTTP transport shared by all sources
pub struct HttpTransport {
    config: TransportConfig,
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the given configuration
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Browser-like headers with a randomly chosen user agent
    pub fn rotated_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let agents = &self.config.user_agents;
        if !agents.is_empty() {
            let agent = &agents[random_range(0..agents.len())];
            if let Ok(value) = HeaderValue::from_str(agent) {
                headers.insert(USER_AGENT, value);
            }
        }

        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers
    }

    /// Send a request, retrying on network errors and non-2xx statuses
    pub async fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let builder = request.build(&self.client, self.rotated_headers());

            match builder.send().await.and_then(Response::error_for_status) {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        url = %request.url(),
                        attempt,
                        attempts,
                        error = %e,
                        "Request failed"
                    );
                    last_error = e.to_string();
                }
            }

            if attempt < attempts {
                let backoff = Duration::from_millis(self.config.retry_delay_ms * u64::from(attempt));
                tokio::time::sleep(backoff).await;
            }
        }

        Err(TransportError::Exhausted {
            url: request.url().to_string(),
            attempts,
            last_error,
        })
    }
}
