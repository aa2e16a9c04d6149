//! RPC monitor library crate.
//!
//! This crate watches a set of Ethereum JSON-RPC endpoints and measures how
//! quickly each one answers `eth_blockNumber` every time a new block shows
//! up on a reference endpoint:
//!
//! - the endpoint list loaded at startup (`registry`),
//! - JSON-RPC clients behind small traits (`rpc`),
//! - single-endpoint latency probes (`probe`),
//! - the block-driven polling loop (`monitor`),
//! - Prometheus histograms and the `/metrics` exporter (`metrics`),
//! - process-level settings (`config`) and error types (`error`).

pub mod config;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod probe;
pub mod registry;
pub mod rpc;

#[cfg(test)]
mod testing;

pub use config::{MetricsConfig, MonitorConfig, RpcClientConfig};
pub use error::{ConfigError, MonitorError, ProbeError, RpcError};
pub use metrics::{LatencyRecorder, MetricsRegistry, RpcMetrics, run_prometheus_http_server};
pub use monitor::{ChainHead, ChainHeadMonitor, HeadUpdate, PollOutcome};
pub use probe::{ProbeReport, probe_endpoint};
pub use registry::{Endpoint, EndpointRegistry};
pub use rpc::{ChainClient, Connector, HttpConnector, HttpRpcClient};

/// The monitor as wired up by the binary: HTTP endpoints, Prometheus sink.
pub type DefaultMonitor = ChainHeadMonitor<HttpConnector, MetricsRegistry>;
