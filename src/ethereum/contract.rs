//! Dynamic contract bindings built from explorer ABIs.
//!
//! A [`ContractHandle`] pairs an address with an [`AbiDescriptor`] and answers
//! two questions: does the ABI declare a function, and what does calling it
//! return. Capability checks only ever consult the parsed ABI.

use std::collections::BTreeSet;
use std::sync::Arc;

use alloy::{dyn_abi::DynSolValue, json_abi::JsonAbi, primitives::Address};
use async_trait::async_trait;

use crate::{
    error::{AppError, Result},
    ethereum::explorer::ExplorerClient,
};

/// Parsed contract ABI plus the set of its function names.
#[derive(Debug, Clone)]
pub struct AbiDescriptor {
    abi: JsonAbi,
}

impl AbiDescriptor {
    /// Wrap an already parsed ABI.
    pub fn new(abi: JsonAbi) -> Self {
        Self { abi }
    }

    /// Parse an ABI from its JSON text, as returned by `getabi`.
    pub fn from_json(json: &str) -> Result<Self> {
        let abi: JsonAbi = serde_json::from_str(json)
            .map_err(|e| AppError::Parse(format!("Invalid ABI document: {}", e)))?;
        Ok(Self::new(abi))
    }

    /// Whether the ABI declares a function with this name (any overload).
    pub fn has_function(&self, name: &str) -> bool {
        self.abi.functions.contains_key(name)
    }

    /// All declared function names.
    pub fn function_names(&self) -> BTreeSet<&str> {
        self.abi.functions.keys().map(String::as_str).collect()
    }

    /// The underlying alloy ABI.
    pub fn json_abi(&self) -> &JsonAbi {
        &self.abi
    }
}

/// Chain access needed to invoke contract functions.
#[async_trait]
pub trait ContractCaller: Send + Sync {
    /// Call `function` on the contract at `address` using `abi` for encoding.
    ///
    /// Implementations report failures as `AppError::Call` naming the
    /// address and function.
    async fn call_function(
        &self,
        address: Address,
        abi: &JsonAbi,
        function: &str,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>>;
}

/// An address bound to an ABI, with capability checks and calls.
#[derive(Clone)]
pub struct ContractHandle {
    address: Address,
    abi: Arc<AbiDescriptor>,
    caller: Arc<dyn ContractCaller>,
}

impl std::fmt::Debug for ContractHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractHandle")
            .field("address", &self.address)
            .field("functions", &self.abi.function_names())
            .finish()
    }
}

impl ContractHandle {
    pub fn new(address: Address, abi: Arc<AbiDescriptor>, caller: Arc<dyn ContractCaller>) -> Self {
        Self { address, abi, caller }
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.abi.has_function(name)
    }

    /// Call a function and return its decoded outputs.
    pub async fn call_function(&self, name: &str, args: &[DynSolValue]) -> Result<Vec<DynSolValue>> {
        tracing::debug!(address = %self.address, function = name, "Calling contract function");
        self.caller.call_function(self.address, self.abi.json_abi(), name, args).await
    }

    /// Call a no-argument function whose first output is an address.
    pub async fn call_address(&self, name: &str) -> Result<Address> {
        let outputs = self.call_function(name, &[]).await?;
        outputs.first().and_then(DynSolValue::as_address).ok_or_else(|| {
            AppError::UnexpectedReturn { address: self.address, function: name.to_string() }
        })
    }
}

/// Builds [`ContractHandle`]s, fetching ABIs from the explorer when needed.
#[derive(Clone)]
pub struct ContractBinder {
    explorer: ExplorerClient,
    caller: Arc<dyn ContractCaller>,
}

impl ContractBinder {
    pub fn new(explorer: ExplorerClient, caller: Arc<dyn ContractCaller>) -> Self {
        Self { explorer, caller }
    }

    /// Fetch the verified ABI of `address`.
    pub async fn fetch_abi(&self, address: Address) -> Result<Arc<AbiDescriptor>> {
        self.explorer.get_abi(address).await.map(Arc::new)
    }

    /// Bind `address` to `abi`, or to its own explorer ABI when `abi` is `None`.
    pub async fn bind(
        &self,
        address: Address,
        abi: Option<Arc<AbiDescriptor>>,
    ) -> Result<ContractHandle> {
        let abi = match abi {
            Some(abi) => abi,
            None => self.fetch_abi(address).await?,
        };
        Ok(ContractHandle::new(address, abi, self.caller.clone()))
    }
}
