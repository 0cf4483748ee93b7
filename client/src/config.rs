//! Client configuration loaded from environment variables.

use std::time::Duration;

use crate::errors::{ClientError, Result};
use crate::types::Address;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// JSON-RPC endpoint of the wallet node
    pub rpc_url: String,
    /// HODLJarFactory contract address
    pub factory: Address,
    /// USDC token contract address
    pub token: Address,
    /// NFT collection contract address
    pub collection: Address,
    /// Base URL of the pinning-service API
    pub storage_api_url: String,
    /// Bearer token for the pinning-service upload endpoints
    pub storage_token: String,
    /// Gateway prefix used to resolve content identifiers over HTTP
    pub ipfs_gateway: String,
    /// How long a submission may stay unanswered before the attempt is
    /// reported failed
    pub submit_timeout: Duration,
    /// How long to poll for a receipt once a transaction is submitted
    pub confirm_timeout: Duration,
    /// Delay between receipt polls
    pub receipt_poll_interval: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Ok(ClientConfig {
            rpc_url: env_var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".to_string()),
            factory: address_var("JAR_FACTORY_ADDRESS")?,
            token: address_var("USDC_ADDRESS")?,
            collection: address_var("NFT_COLLECTION_ADDRESS")?,
            storage_api_url: env_var("STORAGE_API_URL")
                .unwrap_or_else(|_| "https://api.pinata.cloud".to_string()),
            storage_token: env_var("STORAGE_API_TOKEN").map_err(|_| {
                ClientError::Config("STORAGE_API_TOKEN environment variable is required".to_string())
            })?,
            ipfs_gateway: env_var("IPFS_GATEWAY")
                .unwrap_or_else(|_| "https://ipfs.io/ipfs/".to_string()),
            submit_timeout: secs_var("SUBMIT_TIMEOUT_SECS", 180)?,
            confirm_timeout: secs_var("CONFIRM_TIMEOUT_SECS", 60)?,
            receipt_poll_interval: millis_var("RECEIPT_POLL_MS", 2000)?,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| ClientError::Config(format!("Missing env var: {key}")))
}

fn address_var(key: &str) -> Result<Address> {
    let value = env_var(key)
        .map_err(|_| ClientError::Config(format!("{key} environment variable is required")))?;
    Address::parse(&value).map_err(|_| ClientError::Config(format!("Invalid {key}: {value}")))
}

fn secs_var(key: &str, default: u64) -> Result<Duration> {
    env_var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map(Duration::from_secs)
        .map_err(|_| ClientError::Config(format!("Invalid {key}")))
}

fn millis_var(key: &str, default: u64) -> Result<Duration> {
    env_var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map(Duration::from_millis)
        .map_err(|_| ClientError::Config(format!("Invalid {key}")))
}
