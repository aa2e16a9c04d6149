//! Chain-head monitor.
//!
//! The monitor polls the reference endpoint (the first registry entry) for
//! its block number. Every time the height moves forward it launches one
//! detached probe task per registry entry and goes straight back to polling;
//! probes from consecutive blocks may overlap freely.
//!
//! ```text
//! Idle --connect reference--> Polling --(H > C)--> fan out N probes
//!   |                            ^  |
//!   | connect error: fatal       |  +--(H <= C)--> nothing
//!   v                            +--(query error)--> backoff
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::MonitorConfig;
use crate::error::{MonitorError, ProbeError, RpcError};
use crate::metrics::LatencyRecorder;
use crate::probe::{ProbeReport, probe_endpoint};
use crate::registry::EndpointRegistry;
use crate::rpc::{ChainClient, Connector};

/// Handle to one detached probe task.
pub type ProbeHandle = JoinHandle<Result<ProbeReport, ProbeError>>;

/// Result of comparing a fresh reading with the stored height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadUpdate {
    /// First reading; it becomes the baseline without triggering probes.
    Baseline(u64),
    /// The height strictly increased.
    Advanced { from: u64, to: u64 },
    /// The reading was equal to or below the stored height and was dropped.
    Unchanged { current: u64, observed: u64 },
}

/// Last-seen reference height.
///
/// The stored value never decreases. The lock is held only for the
/// compare-and-update, never across any network I/O.
#[derive(Debug, Default)]
pub struct ChainHead {
    height: Mutex<Option<u64>>,
}

impl ChainHead {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<u64> {
        *self.height.lock().await
    }

    /// Stores `observed` if it is strictly above the current height.
    pub async fn observe(&self, observed: u64) -> HeadUpdate {
        let mut height = self.height.lock().await;
        match *height {
            None => {
                *height = Some(observed);
                HeadUpdate::Baseline(observed)
            }
            Some(current) if observed > current => {
                *height = Some(observed);
                HeadUpdate::Advanced {
                    from: current,
                    to: observed,
                }
            }
            Some(current) => HeadUpdate::Unchanged { current, observed },
        }
    }
}

/// What a single poll of the reference endpoint did.
#[derive(Debug)]
pub enum PollOutcome {
    Baseline(u64),
    /// A new block was seen and one probe per endpoint was launched.
    NewBlock { height: u64, probes: Vec<ProbeHandle> },
    Unchanged(u64),
    /// The reference query failed; the stored height is untouched.
    Failed(RpcError),
}

/// Block-driven latency monitor.
pub struct ChainHeadMonitor<C, R: ?Sized> {
    registry: EndpointRegistry,
    connector: Arc<C>,
    recorder: Arc<R>,
    head: Arc<ChainHead>,
    poll_interval: Duration,
    retry_backoff: Duration,
}

impl<C, R> ChainHeadMonitor<C, R>
where
    C: Connector,
    R: LatencyRecorder + ?Sized,
{
    pub fn new(
        config: &MonitorConfig,
        registry: EndpointRegistry,
        connector: Arc<C>,
        recorder: Arc<R>,
    ) -> Self {
        Self {
            registry,
            connector,
            recorder,
            head: Arc::new(ChainHead::new()),
            poll_interval: config.poll_interval,
            retry_backoff: config.retry_backoff,
        }
    }

    pub fn head(&self) -> &Arc<ChainHead> {
        &self.head
    }

    /// Connects to the reference endpoint. Failure here is fatal.
    pub async fn connect_reference(&self) -> Result<C::Client, MonitorError> {
        let reference = self.registry.reference();
        self.connector
            .connect(&reference.url)
            .await
            .map_err(|source| MonitorError::ReferenceConnect {
                name: reference.name.clone(),
                url: reference.url.clone(),
                source,
            })
    }

    /// Queries the reference once and fans out probes on a new block.
    pub async fn poll_once(&self, reference: &C::Client) -> PollOutcome {
        let observed = match reference.block_number().await {
            Ok(height) => height,
            Err(err) => {
                tracing::warn!("failed to fetch latest block from reference endpoint: {err}");
                return PollOutcome::Failed(err);
            }
        };

        match self.head.observe(observed).await {
            HeadUpdate::Baseline(height) => {
                tracing::info!(height, "chain head baseline");
                PollOutcome::Baseline(height)
            }
            HeadUpdate::Advanced { to, .. } => {
                tracing::info!(height = to, "new block mined");
                PollOutcome::NewBlock {
                    height: to,
                    probes: self.fan_out(),
                }
            }
            HeadUpdate::Unchanged { current, observed } => {
                if observed < current {
                    tracing::debug!(current, observed, "reference height went backwards, ignoring");
                }
                PollOutcome::Unchanged(current)
            }
        }
    }

    /// Spawns one independent probe per registry entry.
    ///
    /// The handles may be dropped; the tasks keep running detached.
    pub fn fan_out(&self) -> Vec<ProbeHandle> {
        self.registry
            .iter()
            .cloned()
            .map(|endpoint| {
                let connector = self.connector.clone();
                let recorder = self.recorder.clone();
                tokio::spawn(async move {
                    probe_endpoint(connector.as_ref(), recorder.as_ref(), &endpoint).await
                })
            })
            .collect()
    }

    /// Runs the monitor until the process exits.
    ///
    /// Only returns if the reference endpoint cannot be connected at
    /// startup.
    pub async fn run(self) -> Result<(), MonitorError> {
        let reference = self.connect_reference().await?;
        let endpoint = self.registry.reference();
        tracing::info!(
            rpc_name = %endpoint.name,
            rpc_url = %endpoint.url,
            endpoints = self.registry.len(),
            "monitoring chain head"
        );

        loop {
            match self.poll_once(&reference).await {
                PollOutcome::Failed(_) => {
                    tokio::time::sleep(self.retry_backoff).await;
                    continue;
                }
                PollOutcome::NewBlock { .. }
                | PollOutcome::Baseline(_)
                | PollOutcome::Unchanged(_) => {}
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
