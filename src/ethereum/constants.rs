//! Ethereum network constants.
//!
//! Contains endpoints, reference addresses and the accessor probing rules.

use alloy::primitives::{address, Address};

// ============================================================================
// Endpoints
// ============================================================================

/// Etherscan API endpoint for Ethereum Mainnet.
pub const ETHERSCAN_API_URL: &str = "https://api.etherscan.io/api";

/// Alchemy Ethereum Mainnet endpoint, without the API key.
pub const ALCHEMY_MAINNET_URL: &str = "https://eth-mainnet.g.alchemy.com/v2";

/// Build the Alchemy mainnet RPC URL for an API key.
pub fn alchemy_rpc_url(api_key: &str) -> String {
    format!("{ALCHEMY_MAINNET_URL}/{api_key}")
}

/// Prefix of the explorer `result` field when a request was throttled.
pub const RATE_LIMIT_MARKER: &str = "Max rate limit reached";

// ============================================================================
// Underlying accessor probing
// ============================================================================

/// Accessor names checked in priority order; the first one present wins.
pub const ACCESSOR_CANDIDATES: [&str; 3] = [PROXY_ADMIN_FUNCTION, "underlying", "token"];

/// Administrative function that marks an upgradeable proxy (Aave v2 aTokens).
pub const PROXY_ADMIN_FUNCTION: &str = "upgradeToAndCall";

/// Address whose verified ABI is the Aave aToken implementation.
pub const PROXY_ABI_SOURCE: Address = address!("1C050bCa8BAbe53Ef769d0d2e411f556e1a27E7B");

/// Accessor invoked through the implementation ABI when a proxy is detected.
pub const PROXY_UNDERLYING_FUNCTION: &str = "UNDERLYING_ASSET_ADDRESS";
