//! Chain client for the HODL Jar fundraising system.
//!
//! A **HODL jar** is a small fundraising contract tied to one foster child:
//! a factory deploys jars, each jar accepts exactly one USDC donation and
//! holds it for the child's custodian, and a companion NFT collection mints
//! the children's artwork with its metadata pinned off-chain. This crate is
//! the calling side of that system — it encodes the contract calls, drives
//! them through a wallet node, and folds every result into a
//! `{success, message}` outcome the caller can render directly.
//!
//! | Concern   | Client                 | Operations |
//! |-----------|------------------------|------------|
//! | Discovery | [`JarRegistryClient`]  | [`list_jars`](registry::JarRegistryClient::list_jars) |
//! | Funding   | [`JarLifecycleClient`] | [`create_jar`](lifecycle::JarLifecycleClient::create_jar), [`donate`](lifecycle::JarLifecycleClient::donate), [`withdraw`](lifecycle::JarLifecycleClient::withdraw) |
//! | Artwork   | [`ArtifactClient`]     | [`mint_artwork`](artifact::ArtifactClient::mint_artwork), [`list_collection`](artifact::ArtifactClient::list_collection) |
//!
//! ## Architecture
//!
//! Keys and signing stay inside the wallet node behind [`WalletProvider`];
//! off-chain image and metadata storage sits behind [`MetadataStore`]. A
//! [`WalletSession`] binds one account to one provider and is passed
//! explicitly to every operation — the crate keeps no ambient wallet state.
//!
//! Public operations never return `Err`: failures are caught at the client
//! boundary and reported in the outcome next to a [`FailureKind`] callers
//! can branch on. There are no retries and no rollback of partial progress;
//! a failed step leaves earlier side effects (an outstanding allowance, a
//! pinned image) in place for the user to retry from.

pub mod abi;
pub mod amount;
pub mod artifact;
pub mod config;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod registry;
pub mod rpc;
pub mod storage;
pub mod types;
pub mod wallet;

pub use amount::TokenAmount;
pub use artifact::{ArtifactClient, ArtworkSubmission, CollectionOutcome, MintOutcome};
pub use config::ClientConfig;
pub use errors::{ClientError, FailureKind};
pub use events::ChainEvent;
pub use lifecycle::{
    CreateJarOutcome, CreateJarRequest, DonationOutcome, JarLifecycleClient, WithdrawalOutcome,
};
pub use registry::{JarListOutcome, JarRegistryClient};
pub use rpc::JsonRpcWallet;
pub use storage::{HttpMetadataStore, MetadataStore, StoredContent};
pub use types::{Address, Artifact, Jar, MetadataTrait, NftMetadata, TxHash, TxReceipt};
pub use wallet::{WalletProvider, WalletSession};
