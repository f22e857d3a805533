//! Ethereum interaction module.
//!
//! Contains the RPC client, the block explorer client, and dynamic contract bindings.

pub mod client;
pub mod constants;
pub mod contract;
pub mod explorer;

pub use client::{EthereumClient, HttpProvider};
pub use contract::{AbiDescriptor, ContractBinder, ContractCaller, ContractHandle};
pub use explorer::{ExplorerClient, ExplorerResponse, ExplorerTransport, HttpExplorerTransport};
