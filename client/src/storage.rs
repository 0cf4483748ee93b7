//! Off-chain content storage: image and metadata uploads, metadata fetch.
//!
//! The store is content-addressed: uploads return a content identifier plus
//! a gateway URL that resolves it over HTTP. Uploads are never rolled back —
//! content pinned by a pipeline that later fails simply stays pinned.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::{ClientError, Result};
use crate::types::NftMetadata;

/// A stored blob: its content identifier and the gateway URL resolving it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredContent {
    pub cid: String,
    pub url: String,
}

/// The remote content store consumed by the artifact pipeline.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Upload image bytes; returns where they now live.
    async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<StoredContent>;

    /// Upload a metadata document as JSON.
    async fn upload_metadata(&self, metadata: &NftMetadata) -> Result<StoredContent>;

    /// Dereference a token URI into its metadata document.
    async fn fetch_metadata(&self, uri: &str) -> Result<NftMetadata>;
}

/// Rewrite an `ipfs://` URI to its HTTP gateway form; other URIs pass
/// through unchanged.
pub fn gateway_url(uri: &str, gateway: &str) -> String {
    match uri.strip_prefix("ipfs://") {
        Some(cid) => format!("{}/{}", gateway.trim_end_matches('/'), cid),
        None => uri.to_string(),
    }
}

fn pin_name(prefix: &str) -> String {
    format!("{prefix}-{}", Utc::now().timestamp_millis())
}

// ─────────────────────────────────────────────────────────
// Pinning-service implementation
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// [`MetadataStore`] backed by a Pinata-compatible pinning API and an HTTP
/// gateway for reads.
pub struct HttpMetadataStore {
    client: Client,
    api_url: String,
    token: String,
    gateway: String,
}

impl HttpMetadataStore {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(client: Client, config: &ClientConfig) -> Self {
        HttpMetadataStore {
            client,
            api_url: config.storage_api_url.trim_end_matches('/').to_string(),
            token: config.storage_token.clone(),
            gateway: config.ipfs_gateway.clone(),
        }
    }

    fn content(&self, cid: String) -> StoredContent {
        let url = format!("{}/{}", self.gateway.trim_end_matches('/'), cid);
        StoredContent { cid, url }
    }
}

#[async_trait]
impl MetadataStore for HttpMetadataStore {
    async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<StoredContent> {
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("pinataMetadata", json!({ "name": pin_name("NFT-Image") }).to_string());

        let response = self
            .client
            .post(format!("{}/pinning/pinFileToIPFS", self.api_url))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Storage(format!("Error uploading image: {e}")))?;

        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::Storage(format!(
                "Failed to upload image: {body}"
            )));
        }

        let pinned: PinResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Storage(format!("Error uploading image: {e}")))?;
        debug!(cid = %pinned.ipfs_hash, "image pinned");
        Ok(self.content(pinned.ipfs_hash))
    }

    async fn upload_metadata(&self, metadata: &NftMetadata) -> Result<StoredContent> {
        let body = json!({
            "pinataContent": metadata,
            "pinataMetadata": { "name": pin_name("NFT-Metadata") },
        });

        let response = self
            .client
            .post(format!("{}/pinning/pinJSONToIPFS", self.api_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Storage(format!("Error uploading metadata: {e}")))?;

        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::Storage(format!(
                "Failed to upload metadata: {body}"
            )));
        }

        let pinned: PinResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Storage(format!("Error uploading metadata: {e}")))?;
        debug!(cid = %pinned.ipfs_hash, "metadata pinned");
        Ok(self.content(pinned.ipfs_hash))
    }

    async fn fetch_metadata(&self, uri: &str) -> Result<NftMetadata> {
        let url = gateway_url(uri, &self.gateway);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Storage(format!("Error fetching metadata: {e}")))?;

        if !response.status().is_success() {
            return Err(ClientError::Storage(format!(
                "Metadata fetch returned {} for {url}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Storage(format!("Error fetching metadata: {e}")))
    }
}
