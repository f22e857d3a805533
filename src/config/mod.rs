//! Configuration management module.
//!
//! Handles loading configuration from environment variables.

use std::env;

use crate::error::AppError;
use crate::ethereum::constants::{alchemy_rpc_url, ETHERSCAN_API_URL};

/// Default number of consecutive rate-limited explorer responses tolerated per query.
pub const DEFAULT_EXPLORER_MAX_ATTEMPTS: u32 = 20;

/// Default cap on in-flight explorer requests.
pub const DEFAULT_EXPLORER_MAX_CONCURRENCY: usize = 5;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Block explorer (Etherscan) API key.
    pub etherscan_api_key: String,
    /// Block explorer API endpoint.
    pub etherscan_api_url: String,
    /// RPC provider (Alchemy) API key.
    pub alchemy_api_key: String,
    /// Ethereum JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Maximum rate-limited attempts per explorer query before giving up.
    pub explorer_max_attempts: u32,
    /// Maximum number of explorer requests in flight at once.
    pub explorer_max_concurrency: usize,
    /// Logging level (default: info).
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `ETHERSCAN_API_KEY`: Etherscan API key
    /// - `ALCHEMY_API_KEY`: Alchemy API key
    ///
    /// Optional environment variables:
    /// - `ETHEREUM_RPC_URL`: overrides the Alchemy mainnet endpoint
    /// - `ETHERSCAN_API_URL`: explorer endpoint (default: Etherscan mainnet)
    /// - `EXPLORER_MAX_ATTEMPTS`: rate-limit retry guard (default: 20)
    /// - `EXPLORER_MAX_CONCURRENCY`: in-flight explorer requests (default: 5)
    /// - `LOG_LEVEL`: Logging level (default: info)
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("{key} environment variable not set")))
        };

        let etherscan_api_key = required("ETHERSCAN_API_KEY")?;
        let alchemy_api_key = required("ALCHEMY_API_KEY")?;

        let rpc_url = lookup("ETHEREUM_RPC_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| alchemy_rpc_url(&alchemy_api_key));

        let etherscan_api_url =
            lookup("ETHERSCAN_API_URL").unwrap_or_else(|| ETHERSCAN_API_URL.to_string());

        let explorer_max_attempts = parse_or(
            "EXPLORER_MAX_ATTEMPTS",
            lookup("EXPLORER_MAX_ATTEMPTS"),
            DEFAULT_EXPLORER_MAX_ATTEMPTS,
        )?;
        let explorer_max_concurrency = parse_or(
            "EXPLORER_MAX_CONCURRENCY",
            lookup("EXPLORER_MAX_CONCURRENCY"),
            DEFAULT_EXPLORER_MAX_CONCURRENCY,
        )?;

        if explorer_max_attempts == 0 || explorer_max_concurrency == 0 {
            return Err(AppError::Config(
                "EXPLORER_MAX_ATTEMPTS and EXPLORER_MAX_CONCURRENCY must be positive".into(),
            ));
        }

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            etherscan_api_key,
            etherscan_api_url,
            alchemy_api_key,
            rpc_url,
            explorer_max_attempts,
            explorer_max_concurrency,
            log_level,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{key} must be a positive integer, got '{v}'"))),
    }
}
