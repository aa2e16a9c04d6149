//! Error types for the RPC monitor.
//!
//! Startup failures ([`ConfigError`], [`MonitorError`]) are fatal and end
//! the process. [`RpcError`] and [`ProbeError`] are contained to a single
//! poll cycle or a single probe.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the endpoint list or runtime settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The endpoint list (a file path or other origin) has no entries.
    #[error("{0} does not list any rpc_endpoints")]
    Empty(String),

    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors talking to a single JSON-RPC endpoint.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint returned HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    Protocol(String),
}

/// Why a single endpoint probe produced no latency sample.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to connect: {0}")]
    Connect(#[source] RpcError),

    #[error("failed to fetch block number: {0}")]
    Query(#[source] RpcError),
}

/// Fatal errors that stop the monitor process.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect to reference endpoint {name} ({url}): {source}")]
    ReferenceConnect {
        name: String,
        url: String,
        #[source]
        source: RpcError,
    },

    #[error("failed to build RPC client: {0}")]
    RpcClient(#[source] RpcError),

    #[error("failed to initialise metrics registry: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("metrics HTTP server error: {0}")]
    MetricsServer(#[source] std::io::Error),
}
