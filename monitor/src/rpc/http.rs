//! HTTP JSON-RPC client.
//!
//! Talks to an Ethereum node using the standard JSON-RPC 2.0 envelope:
//!
//! ```json
//! POST /
//! { "jsonrpc": "2.0", "id": 1, "method": "eth_blockNumber", "params": [] }
//!
//! Response:
//! { "jsonrpc": "2.0", "id": 1, "result": "0x1406f40" }
//! ```
//!
//! A single `reqwest::Client` (and its connection pool) is shared by every
//! [`HttpRpcClient`] handed out by one [`HttpConnector`].

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::config::RpcClientConfig;
use crate::error::RpcError;

use super::{ChainClient, Connector};

const BLOCK_NUMBER_METHOD: &str = "eth_blockNumber";

/// Connector for `http://` and `https://` endpoints.
#[derive(Clone, Debug)]
pub struct HttpConnector {
    client: Client,
}

impl HttpConnector {
    pub fn new(config: &RpcClientConfig) -> Result<Self, RpcError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RpcError::Connect(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl Connector for HttpConnector {
    type Client = HttpRpcClient;

    /// Validates `url` and binds it to the shared client.
    ///
    /// No socket is opened here. The first request to a cold endpoint (or one
    /// whose pooled connection was dropped) pays the TCP/TLS handshake, so
    /// its latency sample includes connection setup.
    async fn connect(&self, url: &str) -> Result<HttpRpcClient, RpcError> {
        let url = Url::parse(url)
            .map_err(|e| RpcError::Connect(format!("invalid URL {url:?}: {e}")))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(RpcError::Connect(format!(
                    "unsupported URL scheme {other:?} in {url}"
                )));
            }
        }

        Ok(HttpRpcClient {
            client: self.client.clone(),
            url,
        })
    }
}

/// Client bound to one HTTP JSON-RPC endpoint.
#[derive(Clone, Debug)]
pub struct HttpRpcClient {
    client: Client,
    url: Url,
}

impl HttpRpcClient {
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl ChainClient for HttpRpcClient {
    async fn block_number(&self) -> Result<u64, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: BLOCK_NUMBER_METHOD,
            params: [],
        };

        let resp = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RpcError::Status(status));
        }

        let body = resp.json::<JsonRpcResponse>().await?;
        body.into_block_number()
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: [(); 0],
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

impl JsonRpcResponse {
    fn into_block_number(self) -> Result<u64, RpcError> {
        if let Some(err) = self.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        let result = self
            .result
            .ok_or_else(|| RpcError::Protocol("response has neither result nor error".into()))?;
        parse_quantity(&result)
    }
}

/// Parses a JSON-RPC hex quantity such as `"0x1406f40"`.
pub fn parse_quantity(raw: &str) -> Result<u64, RpcError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| RpcError::Protocol(format!("quantity {raw:?} is missing 0x prefix")))?;

    if digits.is_empty() {
        return Err(RpcError::Protocol(format!("quantity {raw:?} has no digits")));
    }

    u64::from_str_radix(digits, 16)
        .map_err(|e| RpcError::Protocol(format!("invalid quantity {raw:?}: {e}")))
}
