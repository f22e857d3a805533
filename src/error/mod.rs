//! Error types and handling module.
//!
//! Defines all application-specific error types and conversions.

use alloy::primitives::Address;
use rmcp::ErrorData as McpError;
use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport errors.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid Ethereum address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The explorer answered with something other than the expected document.
    #[error("Explorer error for {address}: {message}")]
    Explorer { address: Address, message: String },

    /// The explorer kept rate limiting past the retry guard.
    #[error("Explorer rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    /// None of the accessor candidates exist on the contract.
    #[error("no underlying accessor found for {address}")]
    Resolution { address: Address },

    /// An accessor call failed on-chain or in transport.
    #[error("Call to {function}() on {address} failed: {message}")]
    Call { address: Address, function: String, message: String },

    /// An accessor returned something other than an address.
    #[error("{function}() on {address} did not return an address")]
    UnexpectedReturn { address: Address, function: String },

    /// One resolution in a batch failed; the batch yields nothing.
    #[error("Batch resolution failed at {address}: {source}")]
    Batch {
        address: Address,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Wrap a single-address failure as a batch failure.
    pub fn batch(address: Address, source: AppError) -> Self {
        AppError::Batch { address, source: Box::new(source) }
    }
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidAddress(_) | AppError::Parse(_) | AppError::Resolution { .. } => {
                McpError::invalid_params(err.to_string(), None)
            }
            AppError::Config(_) => McpError::invalid_request(err.to_string(), None),
            _ => McpError::internal_error(err.to_string(), None),
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
