// monitor/src/main.rs

//! RPC latency monitor binary.
//!
//! - endpoint list from YAML (first entry is the chain-head reference)
//! - Prometheus exporter on `/metrics`
//! - block-driven probe loop

use std::sync::Arc;

use rpc_monitor::{
    DefaultMonitor, EndpointRegistry, HttpConnector, MetricsRegistry, MonitorConfig, MonitorError,
    run_prometheus_http_server,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "rpc_monitor=info".to_string()),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), MonitorError> {
    tracing::info!("ethereum RPC monitor starting");

    let cfg = MonitorConfig::from_env()?;

    let registry = EndpointRegistry::load(&cfg.endpoints_path)?;
    tracing::info!(
        path = %cfg.endpoints_path.display(),
        endpoints = registry.len(),
        "config loaded"
    );

    // ---------------------------
    // Metrics registry + exporter
    // ---------------------------

    let metrics = Arc::new(MetricsRegistry::new()?);
    let exporter = run_prometheus_http_server(metrics.clone(), cfg.metrics.listen_addr);

    // ---------------------------
    // Chain-head monitor
    // ---------------------------

    let connector = Arc::new(HttpConnector::new(&cfg.rpc).map_err(MonitorError::RpcClient)?);
    let monitor = DefaultMonitor::new(&cfg, registry, connector, metrics);

    // Both run forever; whichever returns first carries a fatal error.
    tokio::select! {
        res = exporter => res.map_err(MonitorError::MetricsServer),
        res = monitor.run() => res,
    }
}
