//! Clients for Ethereum JSON-RPC endpoints.
//!
//! The monitor and the probes only depend on two small traits:
//!
//! - [`Connector`] turns an endpoint URL into a connected client, and
//! - [`ChainClient`] answers "what is your current block number?".
//!
//! [`http::HttpConnector`] is the production implementation over HTTP(S).

pub mod http;

use std::future::Future;

use crate::error::RpcError;

pub use http::{HttpConnector, HttpRpcClient};

/// A client bound to one endpoint that can report the chain height.
pub trait ChainClient: Send + Sync + 'static {
    /// Issues exactly one block-number request.
    fn block_number(&self) -> impl Future<Output = Result<u64, RpcError>> + Send;
}

/// Opens connections to endpoints.
pub trait Connector: Send + Sync + 'static {
    type Client: ChainClient;

    /// Establishes a connection to `url`. Failures here are never charged
    /// against request latency.
    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Client, RpcError>> + Send;
}
