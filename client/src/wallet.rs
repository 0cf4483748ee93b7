//! The wallet seam: signing, broadcasting, and receipt lookups.
//!
//! Key custody lives entirely behind [`WalletProvider`]; the client hands the
//! wallet fully ABI-encoded calldata and receives hashes and receipts back.
//! A [`WalletSession`] binds one account to one provider and is passed
//! explicitly to every operation, so there is no ambient "current wallet"
//! state anywhere in the crate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use crate::errors::{ClientError, Result};
use crate::types::{Address, TxHash, TxReceipt};

/// The node-side wallet the client drives.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Read-only contract call. Returns the raw ABI-encoded result hex.
    async fn call(&self, to: Address, data: &str) -> Result<String>;

    /// Sign and broadcast a transaction. The wallet owns the keys; a refusal
    /// to sign or broadcast surfaces as [`ClientError::Rejected`].
    async fn send_transaction(&self, from: Address, to: Address, data: &str) -> Result<TxHash>;

    /// The receipt for `hash`, or `None` while the transaction is pending.
    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TxReceipt>>;
}

/// One account bound to one provider.
#[derive(Clone)]
pub struct WalletSession {
    address: Address,
    provider: Arc<dyn WalletProvider>,
}

impl WalletSession {
    pub fn new(address: Address, provider: Arc<dyn WalletProvider>) -> Self {
        WalletSession { address, provider }
    }

    /// The account transactions are sent from.
    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn call(&self, to: Address, data: &str) -> Result<String> {
        self.provider.call(to, data).await
    }

    /// Broadcast calldata from this session's account.
    pub async fn send(&self, to: Address, data: &str) -> Result<TxHash> {
        self.provider.send_transaction(self.address, to, data).await
    }

    /// Poll for the receipt of `hash` until it lands or `timeout` elapses.
    ///
    /// Transport errors propagate immediately; there is no retry layer. A
    /// missed deadline is [`ClientError::ConfirmationTimeout`], and the
    /// transaction itself is left alone (it may still confirm later).
    pub async fn wait_for_receipt(
        &self,
        hash: TxHash,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<TxReceipt> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(receipt) = self.provider.transaction_receipt(hash).await? {
                debug!(tx = %hash, block = ?receipt.block_number, "transaction confirmed");
                return Ok(receipt);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ClientError::ConfirmationTimeout(timeout.as_secs()));
            }
            tokio::time::sleep(poll_interval.min(deadline - now)).await;
        }
    }
}
