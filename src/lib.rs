//! Token Underlying MCP Server Library
//!
//! Resolves lending-market wrapper tokens (Compound cTokens, Yearn yTokens,
//! Aave aTokens) to the underlying assets they represent.
//!
//! # Features
//!
//! - **Explorer Backoff**: Etherscan queries transparently retry while rate limited
//! - **Accessor Probing**: Picks `underlying()`, `token()` or the Aave proxy path from the verified ABI
//! - **Batch Resolution**: Resolves many tokens concurrently, preserving input order
//!
//! # Example
//!
//! ```rust,ignore
//! use alloy::primitives::address;
//! use token_underlying_mcp::{Config, UnderlyingResolver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let resolver = UnderlyingResolver::from_config(&config)?;
//!     // Compound cUSDC resolves to USDC.
//!     let usdc = resolver.resolve_underlying(address!("39AA39c021dfbaE8faC545936693aC917d5E7563")).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod ethereum;
pub mod mcp;
pub mod services;
pub mod types;

pub use config::Config;
pub use error::{AppError, Result};
pub use ethereum::constants::*;
pub use mcp::UnderlyingAssetServer;
pub use services::UnderlyingResolver;
