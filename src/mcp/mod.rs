//! MCP server module.
//!
//! Contains the MCP server implementation with tool handlers.

pub mod server;

pub use server::UnderlyingAssetServer;
pub use server::{GetUnderlyingAddressInput, GetUnderlyingAddressesInput};
