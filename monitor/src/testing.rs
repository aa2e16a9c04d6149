//! Test doubles shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Router, handler::Handler, routing::post};

use crate::error::RpcError;
use crate::rpc::{ChainClient, Connector};

/// Scripted endpoint.
///
/// The first connection replays the scripted readings in order; every
/// later connection (and the first one, once the script runs out) answers
/// with the last successful height. This keeps probe traffic from eating
/// into the readings meant for the reference poller.
#[derive(Default)]
pub struct FakeNode {
    readings: Mutex<VecDeque<Result<u64, ()>>>,
    last: Mutex<Option<u64>>,
    unreachable: bool,
    connect_delay: Duration,
    query_delay: Duration,
    connects: AtomicUsize,
    queries: AtomicUsize,
}

impl FakeNode {
    pub fn with_heights(heights: impl IntoIterator<Item = u64>) -> Self {
        Self::with_readings(heights.into_iter().map(Ok))
    }

    /// `Err(())` entries make the matching query fail.
    pub fn with_readings(readings: impl IntoIterator<Item = Result<u64, ()>>) -> Self {
        Self {
            readings: Mutex::new(readings.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    pub fn query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn next_reading(&self, replay: bool) -> Result<u64, RpcError> {
        let scripted = if replay {
            self.readings.lock().unwrap().pop_front()
        } else {
            None
        };
        let mut last = self.last.lock().unwrap();
        match scripted {
            Some(Ok(height)) => {
                *last = Some(height);
                Ok(height)
            }
            Some(Err(())) => Err(RpcError::Protocol("scripted failure".into())),
            None => (*last).ok_or_else(|| RpcError::Protocol("no scripted readings".into())),
        }
    }
}

pub struct FakeClient {
    node: Arc<FakeNode>,
    replay: bool,
}

impl ChainClient for FakeClient {
    async fn block_number(&self) -> Result<u64, RpcError> {
        self.node.queries.fetch_add(1, Ordering::SeqCst);
        if !self.node.query_delay.is_zero() {
            tokio::time::sleep(self.node.query_delay).await;
        }
        self.node.next_reading(self.replay)
    }
}

/// Connector over a fixed set of [`FakeNode`]s keyed by URL.
#[derive(Default)]
pub struct FakeConnector {
    nodes: HashMap<String, Arc<FakeNode>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, url: &str, node: FakeNode) -> Self {
        self.nodes.insert(url.to_string(), Arc::new(node));
        self
    }

    pub fn node(&self, url: &str) -> Arc<FakeNode> {
        self.nodes
            .get(url)
            .cloned()
            .unwrap_or_else(|| panic!("no fake node for {url}"))
    }
}

impl Connector for FakeConnector {
    type Client = FakeClient;

    async fn connect(&self, url: &str) -> Result<FakeClient, RpcError> {
        let node = self
            .nodes
            .get(url)
            .cloned()
            .ok_or_else(|| RpcError::Connect(format!("unknown endpoint {url}")))?;

        let replay = node.connects.fetch_add(1, Ordering::SeqCst) == 0;
        if !node.connect_delay.is_zero() {
            tokio::time::sleep(node.connect_delay).await;
        }
        if node.unreachable {
            return Err(RpcError::Connect(format!("connection refused: {url}")));
        }
        Ok(FakeClient { node, replay })
    }
}

/// Serves `handler` for `POST /` on an ephemeral local port.
pub async fn spawn_rpc_node<H, T>(handler: H) -> SocketAddr
where
    H: Handler<T, ()>,
    T: 'static,
{
    let app = Router::new().route("/", post(handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake rpc node");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve fake rpc node");
    });
    addr
}
