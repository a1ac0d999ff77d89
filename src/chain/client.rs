//! Substrate JSON-RPC client over WebSocket.
//!
//! # Responsibilities
//! - Query chain head and chain name from a live node
//! - Fail over across configured endpoints
//! - Bound every request with a timeout
//!
//! Read-only: extrinsic submission and typed storage go through
//! [`LiveChain`](crate::chain::live::LiveChain), which uses this client for
//! the best head and paged key listings.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::chain::api::ChainHead;
use crate::chain::types::{ChainError, ChainResult};
use crate::config::schema::NetworkConfig;

/// JSON-RPC client for a Substrate node.
#[derive(Clone)]
pub struct NodeClient {
    /// Primary endpoint followed by failovers.
    endpoints: Vec<String>,
    timeout_duration: Duration,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    id: Option<u64>,
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Header {
    number: String,
}

impl NodeClient {
    /// Create a client for the configured chain endpoints.
    pub fn new(config: &NetworkConfig) -> ChainResult<Self> {
        let mut endpoints = Vec::new();
        for raw in std::iter::once(&config.chain_url).chain(config.failover_urls.iter()) {
            let is_ws = url::Url::parse(raw)
                .map(|u| u.scheme() == "ws" || u.scheme() == "wss")
                .unwrap_or(false);
            if is_ws {
                endpoints.push(raw.clone());
            } else if endpoints.is_empty() {
                return Err(ChainError::Rpc(format!("Invalid chain URL '{}'", raw)));
            } else {
                tracing::warn!(url = %raw, "Ignoring invalid failover chain URL");
            }
        }

        Ok(Self {
            endpoints,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
        })
    }

    /// Primary endpoint followed by failovers.
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// `system_chain`
    pub async fn chain_name(&self) -> ChainResult<String> {
        self.call("system_chain", json!([])).await
    }

    /// Issue one JSON-RPC request, trying each endpoint in turn.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> ChainResult<T> {
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            match timeout(self.timeout_duration, request(endpoint, method, params.clone())).await {
                Ok(Ok(value)) => {
                    return serde_json::from_value(value)
                        .map_err(|e| ChainError::Decode(format!("{}: {}", method, e)));
                }
                Ok(Err(e)) => {
                    tracing::warn!(endpoint_idx = i, method, error = %e, "RPC error, trying next endpoint");
                }
                Err(_) => {
                    tracing::warn!(endpoint_idx = i, method, "RPC timeout, trying next endpoint");
                }
            }
        }
        Err(ChainError::Rpc(format!("All chain endpoints failed for {}", method)))
    }
}

async fn request(endpoint: &str, method: &str, params: Value) -> ChainResult<Value> {
    const REQUEST_ID: u64 = 1;

    let (mut ws, _) = connect_async(endpoint)
        .await
        .map_err(|e| ChainError::Rpc(e.to_string()))?;

    let body = json!({ "jsonrpc": "2.0", "id": REQUEST_ID, "method": method, "params": params });
    ws.send(Message::Text(body.to_string().into()))
        .await
        .map_err(|e| ChainError::Rpc(e.to_string()))?;

    while let Some(msg) = ws.next().await {
        let msg = msg.map_err(|e| ChainError::Rpc(e.to_string()))?;
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let resp: RpcResponse = serde_json::from_str(text.as_str())
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        if resp.id != Some(REQUEST_ID) {
            continue;
        }
        let _ = ws.close(None).await;
        if let Some(err) = resp.error {
            return Err(ChainError::Rpc(format!("{} ({})", err.message, err.code)));
        }
        return Ok(resp.result.unwrap_or(Value::Null));
    }
    Err(ChainError::ConnectionClosed)
}

/// Parse a `0x`-prefixed hex block number.
fn parse_block_number(raw: &str) -> ChainResult<u64> {
    u64::from_str_radix(raw.trim_start_matches("0x"), 16)
        .map_err(|e| ChainError::Decode(format!("block number '{}': {}", raw, e)))
}

#[async_trait]
impl ChainHead for NodeClient {
    async fn block_number(&self) -> ChainResult<u64> {
        let header: Header = self.call("chain_getHeader", json!([])).await?;
        parse_block_number(&header.number)
    }
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient")
            .field("endpoints", &self.endpoints)
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}
