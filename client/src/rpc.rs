//! JSON-RPC 2.0 transport to the wallet node.
//!
//! The node is the only party holding keys: `eth_sendTransaction` hands it
//! calldata and gets back a hash once the transaction is signed and
//! broadcast. No method here retries; every failure is surfaced to the
//! caller on the first attempt.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::{ClientError, Result};
use crate::types::{Address, TxHash, TxReceipt};
use crate::wallet::WalletProvider;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

// ─────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────

/// A [`WalletProvider`] speaking JSON-RPC over HTTP.
pub struct JsonRpcWallet {
    client: Client,
    rpc_url: String,
}

impl JsonRpcWallet {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        JsonRpcWallet {
            client: Client::new(),
            rpc_url: rpc_url.into(),
        }
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(client: Client, rpc_url: impl Into<String>) -> Self {
        JsonRpcWallet {
            client,
            rpc_url: rpc_url.into(),
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": method,
                "params": params,
            }))
            .send()
            .await
            .map_err(|e| ClientError::Wallet(format!("RPC request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Wallet(format!("RPC returned {status}: {body}")));
        }

        let body: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| ClientError::Codec(format!("Malformed RPC response: {e}")))?;

        if let Some(err) = body.error {
            return Err(classify(method, err));
        }

        debug!(method, "RPC call succeeded");
        Ok(body.result.unwrap_or(Value::Null))
    }
}

/// Map an RPC error object onto the client taxonomy. A refusal on
/// `eth_sendTransaction` is the wallet declining to sign or broadcast;
/// everything else is a node-side fault.
fn classify(method: &str, err: RpcError) -> ClientError {
    if method == "eth_sendTransaction" {
        ClientError::Rejected(format!("{} (code {})", err.message, err.code))
    } else {
        ClientError::Wallet(format!("RPC error {}: {}", err.code, err.message))
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    async fn call(&self, to: Address, data: &str) -> Result<String> {
        let result = self
            .request(
                "eth_call",
                json!([{ "to": to.to_string(), "data": data }, "latest"]),
            )
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ClientError::Codec("eth_call result is not a hex string".to_string()))
    }

    async fn send_transaction(&self, from: Address, to: Address, data: &str) -> Result<TxHash> {
        let result = self
            .request(
                "eth_sendTransaction",
                json!([{
                    "from": from.to_string(),
                    "to": to.to_string(),
                    "data": data,
                }]),
            )
            .await?;
        let hash = result.as_str().ok_or_else(|| {
            ClientError::Codec("eth_sendTransaction result is not a hash".to_string())
        })?;
        TxHash::parse(hash)
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TxReceipt>> {
        let result = self
            .request("eth_getTransactionReceipt", json!([hash.to_string()]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let receipt: TxReceipt = serde_json::from_value(result)
            .map_err(|e| ClientError::Codec(format!("Malformed receipt: {e}")))?;
        Ok(Some(receipt))
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
