//! Metrics and instrumentation for the monitor.
//!
//! This module defines the per-endpoint latency histogram and exposes a
//! small HTTP exporter that serves `/metrics` in Prometheus text format.
//!
//! Typical usage:
//!
//! ```ignore
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//! use rpc_monitor::metrics::{LatencyRecorder, MetricsRegistry, run_prometheus_http_server};
//!
//! let registry = Arc::new(MetricsRegistry::new()?);
//! let addr: SocketAddr = "0.0.0.0:9090".parse()?;
//!
//! tokio::spawn(run_prometheus_http_server(registry.clone(), addr));
//!
//! registry.rpc.record("ankr", "https://rpc.ankr.com/eth", 0.084);
//! ```

pub mod prometheus;

pub use self::prometheus::{MetricsRegistry, RpcMetrics, run_prometheus_http_server};

/// Sink for per-endpoint request latencies.
///
/// Implementations must accept concurrent calls from many probe tasks and
/// must not fail.
pub trait LatencyRecorder: Send + Sync + 'static {
    fn record(&self, endpoint_name: &str, endpoint_url: &str, latency_seconds: f64);
}
