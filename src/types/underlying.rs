//! Underlying-asset resolution types.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Addresses to resolve: a single token or an ordered collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressInput {
    /// One address, resolved without fan-out.
    Single(Address),
    /// Several addresses, resolved concurrently.
    Many(Vec<Address>),
}

impl From<Address> for AddressInput {
    fn from(address: Address) -> Self {
        AddressInput::Single(address)
    }
}

impl From<Vec<Address>> for AddressInput {
    fn from(addresses: Vec<Address>) -> Self {
        AddressInput::Many(addresses)
    }
}

impl From<&[Address]> for AddressInput {
    fn from(addresses: &[Address]) -> Self {
        AddressInput::Many(addresses.to_vec())
    }
}

/// Resolution output, shaped like the input it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResolvedAddresses {
    Single(Address),
    Many(Vec<Address>),
}

impl ResolvedAddresses {
    /// Flatten into a list (a single result becomes a one-element list).
    pub fn into_vec(self) -> Vec<Address> {
        match self {
            ResolvedAddresses::Single(address) => vec![address],
            ResolvedAddresses::Many(addresses) => addresses,
        }
    }
}

/// One token and its underlying asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderlyingInfo {
    /// Wrapper token address.
    pub token: String,
    /// Underlying asset address.
    pub underlying: String,
}

impl UnderlyingInfo {
    pub fn new(token: Address, underlying: Address) -> Self {
        Self { token: format!("{token:?}"), underlying: format!("{underlying:?}") }
    }
}

/// Per-token outcome when a batch is resolved without fail-fast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderlyingOutcome {
    /// Wrapper token address.
    pub token: String,
    /// Underlying asset address, when resolution succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlying: Option<String>,
    /// Failure description, when resolution failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UnderlyingOutcome {
    pub fn new(token: Address, result: &Result<Address, AppError>) -> Self {
        match result {
            Ok(underlying) => Self {
                token: format!("{token:?}"),
                underlying: Some(format!("{underlying:?}")),
                error: None,
            },
            Err(e) => Self { token: format!("{token:?}"), underlying: None, error: Some(e.to_string()) },
        }
    }
}
