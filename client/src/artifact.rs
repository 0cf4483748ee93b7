//! Artwork NFTs: the staged mint pipeline and collection listing.
//!
//! Minting walks `image upload -> metadata upload -> mint -> (optional)
//! transfer`, one network call per stage. A failure returns immediately with
//! that stage's message; earlier stages are not rolled back, so an uploaded
//! image or metadata document may outlive a failed mint. The freshly
//! assigned token id is read out of the mint receipt's `Transfer` event; a
//! receipt without one still counts as a successful mint, just with no token
//! id and no transfer.

use std::sync::Arc;

use tracing::{info, warn};

use crate::abi::{self, AbiValue};
use crate::config::ClientConfig;
use crate::errors::{ClientError, FailureKind, Result};
use crate::events::{self, ChainEvent};
use crate::storage::{gateway_url, MetadataStore, StoredContent};
use crate::types::{Address, Artifact, MetadataTrait, NftMetadata, TxHash};
use crate::wallet::WalletSession;

const MINT_SIG: &str = "mint(string)";
const TRANSFER_FROM_SIG: &str = "transferFrom(address,address,uint256)";
const TOTAL_SUPPLY_SIG: &str = "totalSupply()";
const TOKEN_BY_INDEX_SIG: &str = "tokenByIndex(uint256)";
const TOKEN_URI_SIG: &str = "tokenURI(uint256)";

/// A child's artwork as submitted for minting.
#[derive(Debug, Clone)]
pub struct ArtworkSubmission {
    pub name: String,
    pub description: String,
    /// The animal depicted, stored as a metadata trait.
    pub animal: String,
    /// Artist age trait; omitted from the metadata when absent.
    pub artist_age: Option<u8>,
    /// Jar this artwork is dedicated to, stored as a weak `Jar` trait.
    pub jar: Option<String>,
    pub image_name: String,
    pub image: Vec<u8>,
}

/// Result of [`ArtifactClient::mint_artwork`]. The populated fields show how
/// far the pipeline got; partial progress is left in place on failure.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MintOutcome {
    pub success: bool,
    pub message: String,
    pub failure: Option<FailureKind>,
    pub image: Option<StoredContent>,
    pub metadata: Option<StoredContent>,
    pub mint_tx: Option<TxHash>,
    /// Token id recovered from the receipt's `Transfer` event, when present.
    pub token_id: Option<u128>,
    pub transfer_tx: Option<TxHash>,
}

impl MintOutcome {
    fn failure(err: ClientError, prefix: &str) -> Self {
        let message = match &err {
            // Upload failures already carry their stage message.
            ClientError::Storage(m) => m.clone(),
            other => format!("{prefix}{other}"),
        };
        MintOutcome {
            success: false,
            message,
            failure: Some(err.kind()),
            image: None,
            metadata: None,
            mint_tx: None,
            token_id: None,
            transfer_tx: None,
        }
    }
}

/// Result of [`ArtifactClient::list_collection`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct CollectionOutcome {
    pub success: bool,
    pub message: String,
    pub failure: Option<FailureKind>,
    pub artifacts: Vec<Artifact>,
}

impl CollectionOutcome {
    fn failure(err: ClientError) -> Self {
        CollectionOutcome {
            success: false,
            message: format!("Error fetching collection NFTs: {err}"),
            failure: Some(err.kind()),
            artifacts: Vec::new(),
        }
    }
}

/// Client for the NFT collection and its off-chain content.
pub struct ArtifactClient {
    config: ClientConfig,
    store: Arc<dyn MetadataStore>,
}

impl ArtifactClient {
    pub fn new(config: ClientConfig, store: Arc<dyn MetadataStore>) -> Self {
        ArtifactClient { config, store }
    }

    /// Upload the artwork, mint it, and optionally hand it to `recipient`.
    ///
    /// A recipient that is absent, malformed, or the minting account itself
    /// leaves the token with the minter and skips the transfer call.
    pub async fn mint_artwork(
        &self,
        session: &WalletSession,
        submission: ArtworkSubmission,
        recipient: Option<&str>,
    ) -> MintOutcome {
        // Stage one: pin the image.
        let image = match self
            .store
            .upload_image(&submission.image_name, submission.image.clone())
            .await
        {
            Ok(stored) => stored,
            Err(err) => return MintOutcome::failure(err, "Error minting NFT: "),
        };
        info!(cid = %image.cid, "artwork image uploaded");

        // Stage two: pin the metadata document referencing the image.
        let document = build_metadata(&submission, &image);
        let metadata = match self.store.upload_metadata(&document).await {
            Ok(stored) => stored,
            Err(err) => {
                let mut outcome = MintOutcome::failure(err, "Error minting NFT: ");
                outcome.image = Some(image);
                return outcome;
            }
        };
        info!(cid = %metadata.cid, "artwork metadata uploaded");

        // Stage three: mint against the metadata URL.
        let calldata = abi::encode_call(MINT_SIG, &[AbiValue::Str(metadata.url.clone())]);
        let (mint_tx, receipt) = match self.submit(session, self.config.collection, calldata).await
        {
            Ok(confirmed) => confirmed,
            Err(err) => {
                let mut outcome = MintOutcome::failure(err, "Error minting NFT: ");
                outcome.image = Some(image);
                outcome.metadata = Some(metadata);
                return outcome;
            }
        };
        if !receipt.succeeded() {
            return MintOutcome {
                success: false,
                message: format!("Transaction completed but may have failed. Hash: {mint_tx}"),
                failure: Some(FailureKind::Reverted),
                image: Some(image),
                metadata: Some(metadata),
                mint_tx: Some(mint_tx),
                token_id: None,
                transfer_tx: None,
            };
        }

        let token_id = match events::first_event(&receipt, "Transfer") {
            Some(ChainEvent::Transfer { token_id, .. }) => Some(token_id),
            _ => {
                warn!(tx = %mint_tx, "mint receipt carries no Transfer event; token id unavailable");
                None
            }
        };

        let mut outcome = MintOutcome {
            success: true,
            message: format!("NFT minted successfully! Transaction Hash: {mint_tx}"),
            failure: None,
            image: Some(image),
            metadata: Some(metadata),
            mint_tx: Some(mint_tx),
            token_id,
            transfer_tx: None,
        };

        // Stage four: hand the token over, when there is someone to hand it
        // to and a token id to hand over.
        let recipient = resolve_recipient(session.address(), recipient);
        let Some(token_id) = token_id else {
            return outcome;
        };
        if recipient == session.address() {
            return outcome;
        }

        info!(token_id, to = %recipient, "transferring minted artwork");
        let calldata = abi::encode_call(
            TRANSFER_FROM_SIG,
            &[
                AbiValue::Address(session.address()),
                AbiValue::Address(recipient),
                AbiValue::Uint(token_id),
            ],
        );
        match self.submit(session, self.config.collection, calldata).await {
            Ok((transfer_tx, receipt)) if receipt.succeeded() => {
                outcome.transfer_tx = Some(transfer_tx);
                outcome
            }
            Ok((transfer_tx, _)) => {
                outcome.success = false;
                outcome.message =
                    format!("Error transferring NFT: transfer reverted. Hash: {transfer_tx}");
                outcome.failure = Some(FailureKind::Reverted);
                outcome.transfer_tx = Some(transfer_tx);
                outcome
            }
            Err(err) => {
                outcome.success = false;
                outcome.message = format!("Error transferring NFT: {err}");
                outcome.failure = Some(err.kind());
                outcome
            }
        }
    }

    /// List every token in the collection with its resolved metadata.
    ///
    /// Tokens whose metadata cannot be fetched are still listed, with empty
    /// display fields; only chain reads are fatal to the listing.
    pub async fn list_collection(&self, session: &WalletSession) -> CollectionOutcome {
        match self.try_list(session).await {
            Ok(outcome) => outcome,
            Err(err) => CollectionOutcome::failure(err),
        }
    }

    async fn try_list(&self, session: &WalletSession) -> Result<CollectionOutcome> {
        let collection = self.config.collection;
        let raw = session
            .call(collection, &abi::encode_call(TOTAL_SUPPLY_SIG, &[]))
            .await?;
        let supply = abi::decode_uint(&raw)?;
        if supply == 0 {
            return Ok(CollectionOutcome {
                success: true,
                message: "No NFTs found in this collection".to_string(),
                failure: None,
                artifacts: Vec::new(),
            });
        }

        let mut artifacts = Vec::with_capacity(supply as usize);
        for index in 0..supply {
            let raw = session
                .call(
                    collection,
                    &abi::encode_call(TOKEN_BY_INDEX_SIG, &[AbiValue::Uint(index)]),
                )
                .await?;
            let token_id = abi::decode_uint(&raw)?;

            let raw = session
                .call(
                    collection,
                    &abi::encode_call(TOKEN_URI_SIG, &[AbiValue::Uint(token_id)]),
                )
                .await?;
            let token_uri = abi::decode_string(&raw)?;

            let metadata = match self.store.fetch_metadata(&token_uri).await {
                Ok(document) => document,
                Err(err) => {
                    warn!(token_id, error = %err, "metadata fetch failed; listing token bare");
                    NftMetadata::default()
                }
            };

            artifacts.push(Artifact {
                token_id,
                token_uri,
                name: metadata.name,
                description: metadata.description,
                image: gateway_url(&metadata.image, &self.config.ipfs_gateway),
                attributes: metadata.attributes,
            });
        }

        Ok(CollectionOutcome {
            success: true,
            message: format!("Found {} NFTs in the collection", artifacts.len()),
            failure: None,
            artifacts,
        })
    }

    /// Send calldata and wait for its receipt.
    async fn submit(
        &self,
        session: &WalletSession,
        to: Address,
        calldata: String,
    ) -> Result<(TxHash, crate::types::TxReceipt)> {
        let hash = session.send(to, &calldata).await?;
        let receipt = session
            .wait_for_receipt(
                hash,
                self.config.confirm_timeout,
                self.config.receipt_poll_interval,
            )
            .await?;
        Ok((hash, receipt))
    }
}

fn build_metadata(submission: &ArtworkSubmission, image: &StoredContent) -> NftMetadata {
    let mut attributes = Vec::new();
    if let Some(age) = submission.artist_age {
        attributes.push(MetadataTrait::new("Age", age));
    }
    attributes.push(MetadataTrait::new("Animal", submission.animal.clone()));
    if let Some(jar) = &submission.jar {
        attributes.push(MetadataTrait::new("Jar", jar.clone()));
    }
    NftMetadata {
        name: submission.name.clone(),
        description: submission.description.clone(),
        image: image.url.clone(),
        attributes,
    }
}

/// A recipient that fails to parse as a 40-hex-digit address silently
/// defaults to the minter, which means no transfer happens.
fn resolve_recipient(minter: Address, recipient: Option<&str>) -> Address {
    recipient
        .and_then(|r| Address::parse(r.trim()).ok())
        .unwrap_or(minter)
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
