//! Underlying asset resolution service.
//!
//! Lending-market receipt tokens expose their base asset under different
//! accessors: Compound cTokens use `underlying()`, Yearn yTokens use `token()`,
//! and Aave aTokens sit behind a proxy whose own ABI only shows
//! `upgradeToAndCall`. The resolver checks [`ACCESSOR_CANDIDATES`] against the
//! contract's ABI, first match wins, and switches to the aToken implementation
//! ABI when the proxy marker matches.

use std::sync::Arc;

use alloy::primitives::Address;
use tokio::task::JoinSet;

use crate::{
    config::Config,
    error::{AppError, Result},
    ethereum::{
        constants::{
            ACCESSOR_CANDIDATES, PROXY_ABI_SOURCE, PROXY_ADMIN_FUNCTION, PROXY_UNDERLYING_FUNCTION,
        },
        ContractBinder, ContractHandle, EthereumClient, ExplorerClient,
    },
    types::{AddressInput, ResolvedAddresses},
};

/// Pick the accessor to call from a contract's declared functions.
///
/// Returns the first candidate present, or `None` when none is.
pub fn select_accessor<F>(has_function: F) -> Option<&'static str>
where
    F: Fn(&str) -> bool,
{
    ACCESSOR_CANDIDATES.into_iter().find(|&candidate| has_function(candidate))
}

/// Service resolving wrapper tokens to their underlying assets.
#[derive(Clone)]
pub struct UnderlyingResolver {
    binder: ContractBinder,
}

impl UnderlyingResolver {
    /// Create a resolver over an existing binder.
    pub fn new(binder: ContractBinder) -> Self {
        Self { binder }
    }

    /// Create a resolver talking to Etherscan and the configured RPC endpoint.
    pub fn from_config(config: &Config) -> Result<Self> {
        let explorer = ExplorerClient::from_config(config)?;
        let client = Arc::new(EthereumClient::new(&config.rpc_url)?);
        Ok(Self::new(ContractBinder::new(explorer, client)))
    }

    /// Resolve the underlying asset of one wrapper token.
    ///
    /// # Errors
    /// `Resolution` when the ABI declares none of the candidate accessors.
    /// Explorer, transport and call failures are returned as they occur.
    pub async fn resolve_underlying(&self, address: Address) -> Result<Address> {
        let handle = self.binder.bind(address, None).await?;

        let accessor = select_accessor(|name| handle.has_function(name))
            .ok_or(AppError::Resolution { address })?;

        let (handle, accessor) = if accessor == PROXY_ADMIN_FUNCTION {
            tracing::debug!(address = %address, "Upgradeable proxy detected, using implementation ABI");
            (self.bind_proxy(address).await?, PROXY_UNDERLYING_FUNCTION)
        } else {
            (handle, accessor)
        };

        let underlying = handle.call_address(accessor).await?;
        tracing::info!(
            token = %address,
            accessor,
            underlying = %underlying,
            "Resolved underlying asset"
        );

        Ok(underlying)
    }

    /// Rebind a proxy address to the canonical aToken implementation ABI.
    async fn bind_proxy(&self, address: Address) -> Result<ContractHandle> {
        let abi = self.binder.fetch_abi(PROXY_ABI_SOURCE).await?;
        self.binder.bind(address, Some(abi)).await
    }

    /// Resolve one address, or many concurrently.
    ///
    /// A single address is resolved inline and returned unwrapped. A
    /// collection runs one task per address and returns results in input
    /// order. If any task fails the whole call fails with `Batch`, naming the
    /// first address to fail, and the remaining tasks are aborted.
    pub async fn resolve_many(&self, addresses: impl Into<AddressInput>) -> Result<ResolvedAddresses> {
        match addresses.into() {
            AddressInput::Single(address) => {
                self.resolve_underlying(address).await.map(ResolvedAddresses::Single)
            }
            AddressInput::Many(addresses) => {
                let mut tasks = self.spawn_all(&addresses);
                let mut resolved: Vec<Option<Address>> = vec![None; addresses.len()];

                while let Some(joined) = tasks.join_next().await {
                    let (index, result) = joined.map_err(|e| {
                        AppError::Transport(format!("Resolution task failed: {}", e))
                    })?;
                    match result {
                        Ok(underlying) => resolved[index] = Some(underlying),
                        Err(e) => {
                            tracing::warn!(token = %addresses[index], error = %e, "Batch resolution aborted");
                            return Err(AppError::batch(addresses[index], e));
                        }
                    }
                }

                Ok(ResolvedAddresses::Many(resolved.into_iter().flatten().collect()))
            }
        }
    }

    /// Resolve many addresses concurrently, keeping each outcome.
    ///
    /// Output position `i` answers input position `i`; one failure does not
    /// discard the other results.
    pub async fn resolve_each(&self, addresses: &[Address]) -> Vec<Result<Address>> {
        let mut tasks = self.spawn_all(addresses);
        let mut outcomes: Vec<Option<Result<Address>>> = addresses.iter().map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => outcomes[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "Resolution task failed to complete"),
            }
        }

        outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|| {
                    Err(AppError::Transport("Resolution task did not complete".to_string()))
                })
            })
            .collect()
    }

    fn spawn_all(&self, addresses: &[Address]) -> JoinSet<(usize, Result<Address>)> {
        let mut tasks = JoinSet::new();
        for (index, &address) in addresses.iter().enumerate() {
            let resolver = self.clone();
            tasks.spawn(async move { (index, resolver.resolve_underlying(address).await) });
        }
        tasks
    }
}
