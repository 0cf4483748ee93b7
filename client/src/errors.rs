//! Crate-wide error types.
//!
//! Internally everything flows through [`ClientError`]; at the public
//! boundary each operation catches the error and folds it into its outcome
//! struct together with the matching [`FailureKind`], so callers can branch
//! on the kind without parsing message strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Request rejected before anything was sent to the chain.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The wallet node could not be reached or misbehaved at the transport level.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// The wallet refused to sign or broadcast the transaction.
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// No confirmation arrived within the configured window.
    #[error("Timed out after {0}s waiting for confirmation")]
    ConfirmationTimeout(u64),

    /// The transaction was included but the contract reverted it.
    #[error("Transaction reverted on-chain: {0}")]
    Reverted(String),

    /// The metadata store rejected or failed an upload/fetch.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Chain data that could not be ABI-decoded (or a value out of range).
    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// The fieldless kind of this error, for outcome structs.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::Wallet(_) => FailureKind::Wallet,
            Self::Rejected(_) => FailureKind::Rejected,
            Self::ConfirmationTimeout(_) => FailureKind::ConfirmationTimeout,
            Self::Reverted(_) => FailureKind::Reverted,
            Self::Storage(_) => FailureKind::Storage,
            Self::Codec(_) => FailureKind::Codec,
            Self::Config(_) => FailureKind::Config,
        }
    }
}

/// Why an operation failed, stripped of detail so callers can match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    Wallet,
    Rejected,
    ConfirmationTimeout,
    Reverted,
    Storage,
    Codec,
    Config,
}

impl FailureKind {
    /// Short identifier string, stable across releases.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Wallet => "wallet",
            Self::Rejected => "rejected",
            Self::ConfirmationTimeout => "confirmation_timeout",
            Self::Reverted => "reverted",
            Self::Storage => "storage",
            Self::Codec => "codec",
            Self::Config => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
