//! Common utilities for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::{
    dyn_abi::DynSolValue,
    json_abi::JsonAbi,
    primitives::{address, Address},
};
use async_trait::async_trait;
use serde_json::json;

use token_underlying_mcp::{
    ethereum::{ContractBinder, ContractCaller, ExplorerClient, ExplorerResponse, ExplorerTransport},
    AppError, Config, Result, UnderlyingAssetServer, UnderlyingResolver, RATE_LIMIT_MARKER,
};

pub const TOKEN_A: Address = address!("0000000000000000000000000000000000000aaa");
pub const PROXY_B: Address = address!("0000000000000000000000000000000000000bbb");
pub const UNDERLYING_C: Address = address!("0000000000000000000000000000000000000ccc");
pub const UNDERLYING_D: Address = address!("0000000000000000000000000000000000000ddd");
pub const BARE_E: Address = address!("0000000000000000000000000000000000000eee");
pub const YTOKEN_F: Address = address!("0000000000000000000000000000000000000fff");

/// JSON ABI declaring view functions with no inputs and one address output.
pub fn abi_with(functions: &[&str]) -> String {
    let items: Vec<_> = functions
        .iter()
        .map(|name| {
            json!({
                "type": "function",
                "name": name,
                "inputs": [],
                "outputs": [{"name": "", "type": "address", "internalType": "address"}],
                "stateMutability": "view"
            })
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}

/// Explorer double serving ABIs by address, with scripted throttling.
#[derive(Default)]
pub struct MockExplorer {
    abis: Mutex<HashMap<Address, String>>,
    throttle: Mutex<HashMap<Option<Address>, u32>>,
    failing: Mutex<Vec<Address>>,
    delay: Mutex<Option<Duration>>,
    requests: Mutex<Vec<Vec<(String, String)>>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_abi(self, address: Address, functions: &[&str]) -> Self {
        self.abis.lock().unwrap().insert(address, abi_with(functions));
        self
    }

    /// Throttle the next `times` requests for `address` (`None` for queries without one).
    pub fn throttled(self, address: Option<Address>, times: u32) -> Self {
        self.throttle.lock().unwrap().insert(address, times);
        self
    }

    pub fn failing(self, address: Address) -> Self {
        self.failing.lock().unwrap().push(address);
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<Vec<(String, String)>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, address: Address) -> usize {
        let needle = address.to_string();
        self.requests()
            .iter()
            .filter(|params| params.iter().any(|(k, v)| k == "address" && *v == needle))
            .count()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExplorerTransport for MockExplorer {
    async fn get(&self, params: &[(String, String)]) -> Result<ExplorerResponse> {
        self.requests.lock().unwrap().push(params.to_vec());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let address = params
            .iter()
            .find(|(k, _)| k == "address")
            .and_then(|(_, v)| v.parse::<Address>().ok());

        if let Some(address) = address {
            if self.failing.lock().unwrap().contains(&address) {
                return Err(AppError::Transport("connection reset".to_string()));
            }
        }

        {
            let mut throttle = self.throttle.lock().unwrap();
            if let Some(remaining) = throttle.get_mut(&address) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Ok(response(
                        "0",
                        json!(format!("{RATE_LIMIT_MARKER}, please use API Key for higher rate limit")),
                    ));
                }
            }
        }

        let result = match address {
            Some(address) => match self.abis.lock().unwrap().get(&address) {
                Some(abi) => response("1", json!(abi)),
                None => response("0", json!("Contract source code not verified")),
            },
            None => response("1", json!("42")),
        };
        Ok(result)
    }
}

fn response(status: &str, result: serde_json::Value) -> ExplorerResponse {
    ExplorerResponse {
        status: Some(status.to_string()),
        message: Some(if status == "1" { "OK" } else { "NOTOK" }.to_string()),
        result,
    }
}

/// A call observed by [`MockChain`].
#[derive(Debug, Clone)]
pub struct ObservedCall {
    pub address: Address,
    pub function: String,
    pub abi_functions: Vec<String>,
}

/// Chain double returning scripted addresses per (contract, function).
#[derive(Default)]
pub struct MockChain {
    returns: Mutex<HashMap<(Address, String), Address>>,
    delays: Mutex<HashMap<Address, Duration>>,
    calls: Mutex<Vec<ObservedCall>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(self, address: Address, function: &str, value: Address) -> Self {
        self.returns.lock().unwrap().insert((address, function.to_string()), value);
        self
    }

    pub fn delayed(self, address: Address, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(address, delay);
        self
    }

    pub fn calls(&self) -> Vec<ObservedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContractCaller for MockChain {
    async fn call_function(
        &self,
        address: Address,
        abi: &JsonAbi,
        function: &str,
        _args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>> {
        self.calls.lock().unwrap().push(ObservedCall {
            address,
            function: function.to_string(),
            abi_functions: abi.functions.keys().cloned().collect(),
        });

        let call_error = |message: &str| AppError::Call {
            address,
            function: function.to_string(),
            message: message.to_string(),
        };

        // Encoding needs the function in the bound ABI, as with a real instance.
        if !abi.functions.contains_key(function) {
            return Err(call_error("function not found in ABI"));
        }

        let delay = self.delays.lock().unwrap().get(&address).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let value = self.returns.lock().unwrap().get(&(address, function.to_string())).copied();
        value
            .map(|underlying| vec![DynSolValue::Address(underlying)])
            .ok_or_else(|| call_error("execution reverted"))
    }
}

/// Explorer client over a mock transport with generous limits.
pub fn explorer_client(explorer: Arc<MockExplorer>) -> ExplorerClient {
    ExplorerClient::new(explorer, "test-key", 20, 8)
}

/// Resolver wired to the given doubles.
pub fn resolver(explorer: Arc<MockExplorer>, chain: Arc<MockChain>) -> UnderlyingResolver {
    UnderlyingResolver::new(ContractBinder::new(explorer_client(explorer), chain))
}

/// The aToken implementation ABI served for the canonical proxy source.
pub const PROXY_IMPLEMENTATION_FUNCTIONS: &[&str] =
    &["UNDERLYING_ASSET_ADDRESS", "RESERVE_TREASURY_ADDRESS", "POOL"];

/// Doubles for the standard lending-market fixture:
/// A is a cToken over C, B is an Aave proxy over D, E has no accessor, F is a yToken over C.
pub fn lending_fixture() -> (Arc<MockExplorer>, Arc<MockChain>) {
    let explorer = MockExplorer::new()
        .with_abi(TOKEN_A, &["underlying", "token", "balanceOf"])
        .with_abi(PROXY_B, &["upgradeToAndCall", "upgradeTo", "admin"])
        .with_abi(BARE_E, &["balanceOf", "totalSupply"])
        .with_abi(YTOKEN_F, &["token", "pricePerShare"])
        .with_abi(token_underlying_mcp::PROXY_ABI_SOURCE, PROXY_IMPLEMENTATION_FUNCTIONS);

    let chain = MockChain::new()
        .returning(TOKEN_A, "underlying", UNDERLYING_C)
        .returning(TOKEN_A, "token", UNDERLYING_D)
        .returning(PROXY_B, "UNDERLYING_ASSET_ADDRESS", UNDERLYING_D)
        .returning(YTOKEN_F, "token", UNDERLYING_C);

    (Arc::new(explorer), Arc::new(chain))
}

/// Helper to create a live resolver from environment variables.
pub fn create_live_resolver() -> Option<UnderlyingResolver> {
    let config = live_config()?;
    UnderlyingResolver::from_config(&config).ok()
}

/// Helper to create a live server from environment variables.
pub fn create_test_server() -> Option<UnderlyingAssetServer> {
    let config = live_config()?;
    UnderlyingAssetServer::new(config).ok()
}

fn live_config() -> Option<Config> {
    // Load .env file if present
    let _ = dotenvy::dotenv();
    Config::from_env().ok()
}

/// Skip test if the live resolver cannot be created (missing env vars).
#[macro_export]
macro_rules! skip_if_no_resolver {
    () => {
        match common::create_live_resolver() {
            Some(resolver) => resolver,
            None => {
                eprintln!("Skipping test: ETHERSCAN_API_KEY or ALCHEMY_API_KEY not set");
                return;
            }
        }
    };
}
