//! MCP server implementation.

use alloy::primitives::Address;
use rmcp::{
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};

use crate::{
    config::Config,
    error::AppError,
    services::UnderlyingResolver,
    types::{UnderlyingInfo, UnderlyingOutcome},
};

/// Underlying Asset MCP Server.
///
/// Provides tools for resolving lending-market wrapper tokens to their base assets.
#[derive(Clone)]
pub struct UnderlyingAssetServer {
    resolver: UnderlyingResolver,
    tool_router: ToolRouter<Self>,
}

impl UnderlyingAssetServer {
    /// Create a new server from configuration.
    ///
    /// Note: no network calls are made during startup. The explorer and RPC
    /// endpoints are first contacted when a tool is invoked.
    pub fn new(config: Config) -> Result<Self, AppError> {
        tracing::info!("Initializing Underlying Asset MCP Server");

        let resolver = UnderlyingResolver::from_config(&config)?;

        tracing::info!(
            max_attempts = config.explorer_max_attempts,
            max_concurrency = config.explorer_max_concurrency,
            "Underlying Asset MCP Server initialized successfully"
        );

        Ok(Self::with_resolver(resolver))
    }

    /// Create a server around an existing resolver.
    pub fn with_resolver(resolver: UnderlyingResolver) -> Self {
        Self { resolver, tool_router: Self::tool_router() }
    }
}

/// Input parameters for the get_underlying_address tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetUnderlyingAddressInput {
    /// Wrapper token contract address (0x...), e.g. a cToken, yToken or aToken.
    pub address: String,
}

/// Input parameters for the get_underlying_addresses tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetUnderlyingAddressesInput {
    /// Wrapper token contract addresses (0x...).
    pub addresses: Vec<String>,
    /// Report per-token errors instead of failing the whole batch. Default: false.
    #[serde(default)]
    pub partial: Option<bool>,
}

/// Parse and validate an Ethereum address from a string.
///
/// # Returns
/// * `Ok(Address)` - If the address is valid
/// * `Err(McpError)` - If the address is invalid with a descriptive error
fn parse_address(s: &str) -> Result<Address, McpError> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err(McpError::invalid_params("Address cannot be empty", None));
    }

    if !trimmed.starts_with("0x") && !trimmed.starts_with("0X") {
        return Err(McpError::invalid_params(format!("Address must start with '0x': {}", s), None));
    }

    // 0x + 40 hex chars
    if trimmed.len() != 42 {
        return Err(McpError::invalid_params(
            format!(
                "Address must be 42 characters (0x + 40 hex chars), got {}: {}",
                trimmed.len(),
                s
            ),
            None,
        ));
    }

    trimmed.parse::<Address>().map_err(|e| {
        McpError::invalid_params(format!("Invalid address format '{}': {}", s, e), None)
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))
}

#[tool_router]
impl UnderlyingAssetServer {
    /// Resolve the underlying asset of one wrapper token.
    #[tool(
        description = "Get the underlying asset address of a lending-market wrapper token (Compound cToken, Yearn yToken, Aave aToken)."
    )]
    pub async fn get_underlying_address(
        &self,
        Parameters(input): Parameters<GetUnderlyingAddressInput>,
    ) -> Result<String, McpError> {
        tracing::info!(address = %input.address, "get_underlying_address called");

        let token = parse_address(&input.address)?;
        let underlying = self.resolver.resolve_underlying(token).await?;

        to_json(&UnderlyingInfo::new(token, underlying))
    }

    /// Resolve the underlying assets of several wrapper tokens concurrently.
    ///
    /// Results keep the order of the input addresses. By default a single
    /// failure fails the call; with `partial` each token reports its own outcome.
    #[tool(
        description = "Get the underlying asset addresses of several lending-market wrapper tokens, in input order. Set partial=true to report per-token errors instead of failing the batch."
    )]
    pub async fn get_underlying_addresses(
        &self,
        Parameters(input): Parameters<GetUnderlyingAddressesInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            count = input.addresses.len(),
            partial = ?input.partial,
            "get_underlying_addresses called"
        );

        if input.addresses.is_empty() {
            return Err(McpError::invalid_params("addresses cannot be empty", None));
        }

        let tokens =
            input.addresses.iter().map(|s| parse_address(s)).collect::<Result<Vec<_>, _>>()?;

        if input.partial.unwrap_or(false) {
            let outcomes = self.resolver.resolve_each(&tokens).await;
            let report: Vec<UnderlyingOutcome> = tokens
                .iter()
                .zip(outcomes.iter())
                .map(|(token, outcome)| UnderlyingOutcome::new(*token, outcome))
                .collect();
            return to_json(&report);
        }

        let underlying = self.resolver.resolve_many(tokens.clone()).await?.into_vec();
        let report: Vec<UnderlyingInfo> = tokens
            .into_iter()
            .zip(underlying)
            .map(|(token, underlying)| UnderlyingInfo::new(token, underlying))
            .collect();

        to_json(&report)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for UnderlyingAssetServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "token-underlying-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Underlying Asset MCP Server. Resolves lending-market wrapper tokens \
                 (cTokens, yTokens, aTokens) to the base assets they represent."
                    .to_string(),
            ),
        }
    }
}
