//! Token Underlying MCP Server
//!
//! A Model Context Protocol server resolving wrapper tokens to their underlying assets.

use rmcp::ServiceExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use token_underlying_mcp::{Config, UnderlyingAssetServer};

/// `RUST_LOG` wins when it parses; otherwise the configured level applies.
fn log_filter(rust_log: Option<&str>, fallback: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    // stdout carries the MCP stream; logs go to stderr.
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter(rust_log.as_deref(), &config.log_level))
        .init();

    let server = UnderlyingAssetServer::new(config)?;
    tracing::info!("Serving underlying-asset tools over stdio");

    server.serve(rmcp::transport::stdio()).await?.waiting().await?;
    Ok(())
}
