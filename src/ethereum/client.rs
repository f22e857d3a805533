//! Ethereum RPC client.

use alloy::{
    contract::{ContractInstance, Interface},
    dyn_abi::DynSolValue,
    json_abi::JsonAbi,
    network::Ethereum,
    primitives::Address,
    providers::{Provider, ProviderBuilder, RootProvider},
};
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    error::{AppError, Result},
    ethereum::contract::ContractCaller,
};

/// Type alias for the HTTP provider.
pub type HttpProvider = RootProvider<Ethereum>;

/// Ethereum RPC client wrapper with lazy initialization.
#[derive(Clone)]
pub struct EthereumClient {
    /// The underlying provider.
    provider: Arc<HttpProvider>,
}

impl EthereumClient {
    /// Create a new Ethereum client.
    ///
    /// Note: This does NOT make any network calls. The connection is
    /// established lazily when the first operation is performed.
    pub fn new(rpc_url: &str) -> Result<Self> {
        let url = rpc_url
            .parse()
            .map_err(|_| AppError::Config("Invalid RPC URL".to_string()))?;

        #[allow(deprecated)]
        let provider = ProviderBuilder::new().connect_http(url).root().clone();

        // The URL carries the provider key, so only the host is logged.
        let host = rpc_url.split('/').nth(2).unwrap_or_default();
        tracing::info!(rpc_host = %host, "Ethereum client created (lazy initialization)");

        Ok(Self { provider: Arc::new(provider) })
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }
}

#[async_trait]
impl ContractCaller for EthereumClient {
    async fn call_function(
        &self,
        address: Address,
        abi: &JsonAbi,
        function: &str,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>> {
        let call_error = |message: String| AppError::Call {
            address,
            function: function.to_string(),
            message,
        };

        let instance: ContractInstance<HttpProvider, Ethereum> =
            ContractInstance::new(address, self.provider().clone(), Interface::new(abi.clone()));

        let call = instance.function(function, args).map_err(|e| call_error(e.to_string()))?;
        call.call().await.map_err(|e| call_error(e.to_string()))
    }
}
