//! Block explorer (Etherscan) client with rate-limit backoff.
//!
//! Etherscan signals throttling with a `200 OK` whose `result` starts with
//! [`RATE_LIMIT_MARKER`]. [`ExplorerClient::query`] absorbs those responses by
//! sleeping and retrying with a growing wait; callers only ever see the first
//! non-throttled result.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::{AppError, Result},
    ethereum::{constants::RATE_LIMIT_MARKER, contract::AbiDescriptor},
};

/// Raw explorer response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerResponse {
    /// "1" on success, "0" on failure.
    #[serde(default)]
    pub status: Option<String>,
    /// Short status message ("OK", "NOTOK").
    #[serde(default)]
    pub message: Option<String>,
    /// Query payload. A string for most actions.
    pub result: serde_json::Value,
}

impl ExplorerResponse {
    /// Whether the explorer throttled this request.
    pub fn is_rate_limited(&self) -> bool {
        self.result.as_str().is_some_and(|r| r.starts_with(RATE_LIMIT_MARKER))
    }
}

/// Transport used to reach the explorer API.
///
/// Abstracted so the backoff policy can be exercised without a network.
#[async_trait]
pub trait ExplorerTransport: Send + Sync {
    /// Issue one GET with the given query parameters.
    async fn get(&self, params: &[(String, String)]) -> Result<ExplorerResponse>;
}

/// reqwest-backed explorer transport.
pub struct HttpExplorerTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpExplorerTransport {
    /// Create a transport for the given API endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, url: url.to_string() })
    }
}

#[async_trait]
impl ExplorerTransport for HttpExplorerTransport {
    async fn get(&self, params: &[(String, String)]) -> Result<ExplorerResponse> {
        let response = self
            .client
            .get(&self.url)
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Explorer request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "Explorer API returned status: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Parse(format!("Failed to parse explorer response: {}", e)))
    }
}

/// Wait schedule for one query: starts at 0.2s, grows by 1.5x, rounded to 0.01s.
///
/// The wait is kept as an `f64` so each step rounds the binary product the way
/// float rounding does (`2.295` is stored below the midpoint and becomes `2.29`).
#[derive(Debug, Clone)]
pub struct Backoff {
    wait: f64,
    factor: f64,
}

impl Backoff {
    /// Fresh schedule at the initial wait.
    pub fn new() -> Self {
        Self { wait: 0.2, factor: 1.5 }
    }

    /// Current wait in seconds.
    pub fn current(&self) -> Decimal {
        Decimal::from_f64_retain(self.wait).map(|d| d.round_dp(2)).unwrap_or_default()
    }

    /// Return the current wait and advance the schedule.
    pub fn next_wait(&mut self) -> Duration {
        let current = self.wait;
        if let Some(next) = round_cents(self.wait * self.factor) {
            self.wait = next;
        }
        seconds_to_duration(current)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

/// Round to two decimals, half to even, on the exact binary value of `value`.
fn round_cents(value: f64) -> Option<f64> {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
}

fn seconds_to_duration(secs: f64) -> Duration {
    let millis = Decimal::from_f64_retain(secs)
        .and_then(|d| (d.round_dp(3) * Decimal::ONE_THOUSAND).trunc().to_u64())
        .unwrap_or(u64::MAX);
    Duration::from_millis(millis)
}

/// Explorer API client.
///
/// Stateless between calls apart from the shared concurrency permits; every
/// query owns its own [`Backoff`].
#[derive(Clone)]
pub struct ExplorerClient {
    transport: Arc<dyn ExplorerTransport>,
    api_key: String,
    max_attempts: u32,
    permits: Arc<Semaphore>,
}

impl ExplorerClient {
    /// Create a client over an arbitrary transport.
    ///
    /// # Arguments
    /// * `max_attempts` - requests allowed per query while throttled
    /// * `max_concurrency` - explorer requests allowed in flight across all queries
    pub fn new(
        transport: Arc<dyn ExplorerTransport>,
        api_key: impl Into<String>,
        max_attempts: u32,
        max_concurrency: usize,
    ) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            max_attempts: max_attempts.max(1),
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    /// Create an HTTP client from application configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpExplorerTransport::new(&config.etherscan_api_url)?;
        Ok(Self::new(
            Arc::new(transport),
            config.etherscan_api_key.clone(),
            config.explorer_max_attempts,
            config.explorer_max_concurrency,
        ))
    }

    /// Run one logical explorer query, retrying while rate limited.
    ///
    /// The API key is appended to `params`. Returns the `result` field of the
    /// first response that is not throttled.
    ///
    /// # Errors
    /// `RateLimitExceeded` once `max_attempts` requests in a row were throttled;
    /// transport and parse failures are returned immediately.
    pub async fn query(&self, params: &[(&str, &str)]) -> Result<serde_json::Value> {
        let mut params: Vec<(String, String)> =
            params.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        params.push(("apikey".to_string(), self.api_key.clone()));

        let mut backoff = Backoff::new();
        let mut attempt = 0u32;

        loop {
            let response = {
                let _permit = self.permits.acquire().await.map_err(|_| {
                    AppError::Transport("Explorer request permits closed".to_string())
                })?;
                self.transport.get(&params).await?
            };
            attempt += 1;

            if !response.is_rate_limited() {
                debug!(attempt, status = ?response.status, "Explorer query answered");
                return Ok(response.result);
            }

            if attempt >= self.max_attempts {
                warn!(attempts = attempt, "Explorer rate limit persisted, giving up");
                return Err(AppError::RateLimitExceeded { attempts: attempt });
            }

            let wait = backoff.next_wait();
            let wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
            warn!(attempt, wait_ms, "Explorer rate limited, backing off");
            tokio::time::sleep(wait).await;
        }
    }

    /// Fetch and parse the verified ABI of a contract.
    pub async fn get_abi(&self, address: Address) -> Result<AbiDescriptor> {
        let address_str = address.to_string();
        let result = self
            .query(&[("module", "contract"), ("action", "getabi"), ("address", address_str.as_str())])
            .await?;

        let text = result.as_str().ok_or_else(|| AppError::Explorer {
            address,
            message: format!("ABI result is not a string: {result}"),
        })?;

        AbiDescriptor::from_json(text).map_err(|_| AppError::Explorer {
            address,
            message: format!("ABI unavailable: {}", text.chars().take(120).collect::<String>()),
        })
    }
}
