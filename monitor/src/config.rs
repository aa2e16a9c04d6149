//! Top-level configuration for the monitor process.
//!
//! This module aggregates:
//!
//! - the path of the endpoint list file (see [`crate::registry`]),
//! - the metrics exporter listen address,
//! - the polling cadence of the chain-head monitor,
//! - JSON-RPC client settings.
//!
//! [`MonitorConfig::default`] carries the fixed production values;
//! [`MonitorConfig::from_env`] lets a deployment override them through
//! `RPC_MONITOR_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_CONFIG_PATH: &str = "RPC_MONITOR_CONFIG";
pub const ENV_METRICS_ADDR: &str = "RPC_MONITOR_METRICS_ADDR";
pub const ENV_POLL_INTERVAL_MS: &str = "RPC_MONITOR_POLL_INTERVAL_MS";
pub const ENV_RETRY_BACKOFF_MS: &str = "RPC_MONITOR_RETRY_BACKOFF_MS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "RPC_MONITOR_REQUEST_TIMEOUT_MS";

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
        }
    }
}

/// Settings for the HTTP JSON-RPC client shared by all probes.
#[derive(Clone, Debug, Default)]
pub struct RpcClientConfig {
    /// Per-request timeout. `None` keeps the HTTP library default (no
    /// timeout), so a hung endpoint only stalls its own probe task.
    pub request_timeout: Option<Duration>,
}

/// Top-level configuration for the monitor.
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// YAML file listing the endpoints to probe.
    pub endpoints_path: PathBuf,
    pub metrics: MetricsConfig,
    /// Delay between two reference height queries.
    pub poll_interval: Duration,
    /// Delay after a failed reference height query.
    pub retry_backoff: Duration,
    pub rpc: RpcClientConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            endpoints_path: PathBuf::from("config.yaml"),
            metrics: MetricsConfig::default(),
            poll_interval: Duration::from_secs(1),
            retry_backoff: Duration::from_secs(3),
            rpc: RpcClientConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Builds the configuration from defaults plus any `RPC_MONITOR_*`
    /// overrides present in the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`MonitorConfig::from_env`] but reads variables through
    /// `lookup`, which keeps tests away from the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(path) = lookup(ENV_CONFIG_PATH) {
            cfg.endpoints_path = PathBuf::from(path);
        }
        if let Some(addr) = parse_var::<SocketAddr, _>(&lookup, ENV_METRICS_ADDR)? {
            cfg.metrics.listen_addr = addr;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_POLL_INTERVAL_MS)? {
            cfg.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_RETRY_BACKOFF_MS)? {
            cfg.retry_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_REQUEST_TIMEOUT_MS)? {
            cfg.rpc.request_timeout = Some(Duration::from_millis(ms));
        }

        Ok(cfg)
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };

    value
        .trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::InvalidEnv {
            var,
            value,
            reason: e.to_string(),
        })
}
