//! Single-endpoint latency probe.
//!
//! A probe connects to one endpoint, times exactly one `eth_blockNumber`
//! request and, on success, feeds the elapsed time into a
//! [`LatencyRecorder`]. Connection setup happens before the timer starts.

use std::time::{Duration, Instant};

use crate::error::ProbeError;
use crate::metrics::LatencyRecorder;
use crate::registry::Endpoint;
use crate::rpc::{ChainClient, Connector};

/// Outcome of a successful probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeReport {
    /// Block number reported by the endpoint.
    pub height: u64,
    /// Round trip of the block-number request alone.
    pub latency: Duration,
}

/// Probes `endpoint` once.
///
/// Records exactly one sample on success and none on failure. Both outcomes
/// are logged; the error is returned for callers that care, but the monitor
/// drops it.
pub async fn probe_endpoint<C, R>(
    connector: &C,
    recorder: &R,
    endpoint: &Endpoint,
) -> Result<ProbeReport, ProbeError>
where
    C: Connector,
    R: LatencyRecorder + ?Sized,
{
    let result = measure(connector, endpoint).await;

    match &result {
        Ok(report) => {
            recorder.record(&endpoint.name, &endpoint.url, report.latency.as_secs_f64());
            tracing::info!(
                rpc_name = %endpoint.name,
                rpc_url = %endpoint.url,
                height = report.height,
                latency_ms = report.latency.as_millis() as u64,
                "rpc probe succeeded"
            );
        }
        Err(err) => {
            tracing::warn!(
                rpc_name = %endpoint.name,
                rpc_url = %endpoint.url,
                "rpc probe failed: {err}"
            );
        }
    }

    result
}

async fn measure<C>(connector: &C, endpoint: &Endpoint) -> Result<ProbeReport, ProbeError>
where
    C: Connector,
{
    let client = connector
        .connect(&endpoint.url)
        .await
        .map_err(ProbeError::Connect)?;

    let start = Instant::now();
    let response = client.block_number().await;
    let latency = start.elapsed();

    let height = response.map_err(ProbeError::Query)?;
    Ok(ProbeReport { height, latency })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RpcMetrics;
    use crate::testing::{FakeConnector, FakeNode};
    use prometheus::Registry;

    fn metrics() -> RpcMetrics {
        RpcMetrics::register(&Registry::new()).expect("register metrics")
    }

    #[tokio::test]
    async fn success_records_one_sample() {
        let connector = FakeConnector::new().with_node("http://a", FakeNode::with_heights([42]));
        let metrics = metrics();
        let endpoint = Endpoint::new("a", "http://a");

        let report = probe_endpoint(&connector, &metrics, &endpoint)
            .await
            .expect("probe succeeds");

        assert_eq!(report.height, 42);
        assert_eq!(metrics.sample_count("a", "http://a"), 1);
        assert_eq!(connector.node("http://a").queries(), 1);
    }

    #[tokio::test]
    async fn connect_failure_records_nothing() {
        let connector = FakeConnector::new()
            .with_node("http://a", FakeNode::with_heights([1]))
            .with_node("http://down", FakeNode::unreachable());
        let metrics = metrics();
        metrics.record("a", "http://a", 0.02);

        let err = probe_endpoint(&connector, &metrics, &Endpoint::new("down", "http://down"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProbeError::Connect(_)), "unexpected: {err:?}");
        assert_eq!(metrics.sample_count("down", "http://down"), 0);
        assert_eq!(metrics.sample_count("a", "http://a"), 1);
        assert_eq!(connector.node("http://down").queries(), 0);
    }

    #[tokio::test]
    async fn query_failure_records_nothing() {
        let connector =
            FakeConnector::new().with_node("http://flaky", FakeNode::with_readings([Err(())]));
        let metrics = metrics();

        let err = probe_endpoint(&connector, &metrics, &Endpoint::new("flaky", "http://flaky"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProbeError::Query(_)), "unexpected: {err:?}");
        assert_eq!(metrics.sample_count("flaky", "http://flaky"), 0);
    }

    #[tokio::test]
    async fn latency_excludes_connection_setup() {
        let node = FakeNode::with_heights([7])
            .connect_delay(Duration::from_millis(300))
            .query_delay(Duration::from_millis(40));
        let connector = FakeConnector::new().with_node("http://slow", node);
        let metrics = metrics();

        let report = probe_endpoint(&connector, &metrics, &Endpoint::new("slow", "http://slow"))
            .await
            .expect("probe succeeds");

        assert!(report.latency >= Duration::from_millis(40));
        assert!(report.latency < Duration::from_millis(300));

        let recorded = metrics
            .latency_seconds
            .with_label_values(&["slow", "http://slow"])
            .get_sample_sum();
        assert!((recorded - report.latency.as_secs_f64()).abs() < 1e-9);
    }
}
