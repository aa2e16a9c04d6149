//! Prometheus-backed metrics and HTTP exporter.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and the RPC latency histogram, and an async HTTP exporter
//! that serves `/metrics` using `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, header::HeaderValue,
    server::conn::http1, service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{self, Encoder, HistogramOpts, HistogramVec, Registry, TextEncoder};

use super::LatencyRecorder;

/// Namespace prepended to every metric name.
const NAMESPACE: &str = "ethereum";

/// Label names of the latency histogram, in order.
pub const LATENCY_LABELS: [&str; 2] = ["rpc_name", "rpc_url"];

/// RPC-related Prometheus metrics.
#[derive(Clone)]
pub struct RpcMetrics {
    /// `eth_blockNumber` round-trip time per endpoint, in seconds.
    ///
    /// Buckets grow exponentially from 10ms by a factor of 2 (10 buckets,
    /// up to 5.12s, plus `+Inf`).
    pub latency_seconds: HistogramVec,
}

impl RpcMetrics {
    /// Registers the RPC metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let latency_seconds = HistogramVec::new(
            HistogramOpts::new("rpc_latency_seconds", "Latency of Ethereum RPC requests")
                .buckets(prometheus::exponential_buckets(0.01, 2.0, 10)?),
            &LATENCY_LABELS,
        )?;
        registry.register(Box::new(latency_seconds.clone()))?;

        Ok(Self { latency_seconds })
    }

    /// Number of samples recorded so far for one endpoint.
    pub fn sample_count(&self, endpoint_name: &str, endpoint_url: &str) -> u64 {
        self.latency_seconds
            .with_label_values(&[endpoint_name, endpoint_url])
            .get_sample_count()
    }
}

impl LatencyRecorder for RpcMetrics {
    fn record(&self, endpoint_name: &str, endpoint_url: &str, latency_seconds: f64) {
        self.latency_seconds
            .with_label_values(&[endpoint_name, endpoint_url])
            .observe(latency_seconds);
    }
}

/// Wrapper around a Prometheus registry and the RPC metrics.
///
/// This is the main handle passed around the process. Wrap it in an
/// [`Arc`] to share it between the monitor and the exporter.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub rpc: RpcMetrics,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with a fresh underlying `Registry`
    /// and registers the RPC metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some(NAMESPACE.to_string()), None)?;
        let rpc = RpcMetrics::register(&registry)?;
        Ok(Self { registry, rpc })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("failed to encode Prometheus metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl LatencyRecorder for MetricsRegistry {
    fn record(&self, endpoint_name: &str, endpoint_url: &str, latency_seconds: f64) {
        self.rpc.record(endpoint_name, endpoint_url, latency_seconds);
    }
}

/// Runs an HTTP server that exposes Prometheus metrics.
///
/// The server listens on `addr` and serves `GET /metrics` with the
/// Prometheus text exposition format. All other paths return 404.
///
/// Only returns on failure: a bind error, or an error accepting a new
/// connection. Errors on an individual connection are logged.
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("prometheus metrics available at http://{addr}/metrics");
    serve(listener, metrics).await
}

/// Serves metrics on an already-bound listener.
pub async fn serve(listener: TcpListener, metrics: Arc<MetricsRegistry>) -> std::io::Result<()> {
    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                tracing::warn!("prometheus HTTP connection error: {err}");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let mut resp = Response::new(Full::new(Bytes::from(metrics.gather_text())));
            resp.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            Ok(resp)
        }
        _ => {
            let mut resp = Response::new(Full::new(Bytes::from("not found")));
            *resp.status_mut() = StatusCode::NOT_FOUND;
            Ok(resp)
        }
    }
}
