//! Core domain and wire types shared across the client.
//!
//! Chain-side identifiers ([`Address`], [`TxHash`]) are fixed-width byte
//! newtypes that parse from and render to `0x`-prefixed hex, which is how
//! they travel in JSON-RPC payloads and in the metadata store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{ClientError, Result};

// ─────────────────────────────────────────────────────────
// Chain identifiers
// ─────────────────────────────────────────────────────────

/// A 20-byte account or contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Parse a `0x`-prefixed, 40-hex-digit address. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self> {
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| ClientError::Validation(format!("Invalid address: {s}")))?;
        if hex_part.len() != 40 {
            return Err(ClientError::Validation(format!("Invalid address: {s}")));
        }
        let bytes = hex::decode(hex_part)
            .map_err(|_| ClientError::Validation(format!("Invalid address: {s}")))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| ClientError::Validation(format!("Invalid address: {s}")))?;
        Ok(Address(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The all-zero address, used on-chain as "no account".
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A 32-byte transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        TxHash(bytes)
    }

    /// Parse a `0x`-prefixed, 64-hex-digit transaction hash.
    pub fn parse(s: &str) -> Result<Self> {
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| ClientError::Codec(format!("Invalid transaction hash: {s}")))?;
        if hex_part.len() != 64 {
            return Err(ClientError::Codec(format!("Invalid transaction hash: {s}")));
        }
        let bytes = hex::decode(hex_part)
            .map_err(|_| ClientError::Codec(format!("Invalid transaction hash: {s}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ClientError::Codec(format!("Invalid transaction hash: {s}")))?;
        Ok(TxHash(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TxHash::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────
// Receipt shapes (eth_getTransactionReceipt)
// ─────────────────────────────────────────────────────────

/// A mined transaction receipt, as returned by the wallet node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    /// `"0x1"` for success, `"0x0"` for an on-chain revert.
    pub status: Option<String>,
    #[serde(default)]
    pub logs: Vec<TxLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<String>,
}

impl TxReceipt {
    /// Whether the transaction executed without reverting.
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() != Some("0x0")
    }
}

/// One log entry in a receipt: emitting contract, indexed topics, data blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxLog {
    pub address: Address,
    /// `0x`-prefixed 32-byte hex words; `topics[0]` is the event signature hash.
    pub topics: Vec<String>,
    /// `0x`-prefixed hex of the non-indexed fields.
    pub data: String,
}

// ─────────────────────────────────────────────────────────
// Domain records
// ─────────────────────────────────────────────────────────

/// One fundraising jar, hydrated from its on-chain accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jar {
    /// Contract address; the jar's identity for its whole lifetime.
    pub address: Address,
    pub kid_name: String,
    pub image_url: String,
    pub story: String,
    pub age: u8,
    /// Custodian account authorized to withdraw.
    pub foster_home: Address,
    /// `None` until the single allowed donation lands (zero address on-chain).
    pub donor: Option<Address>,
}

impl Jar {
    /// A jar is filled once a donor is recorded; filled jars are terminal.
    pub fn is_filled(&self) -> bool {
        self.donor.is_some()
    }
}

/// A minted collection item together with its resolved metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub token_id: u128,
    pub token_uri: String,
    pub name: String,
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub attributes: Vec<MetadataTrait>,
}

impl Artifact {
    /// The jar this artwork was dedicated to, when the metadata carries one.
    pub fn jar_reference(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|t| t.trait_type == "Jar")
            .and_then(|t| t.value.as_str())
    }
}

/// The metadata document stored off-chain and referenced by `tokenURI`.
/// Every field defaults so a missing or partial document still decodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NftMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub attributes: Vec<MetadataTrait>,
}

/// One `{trait_type, value}` entry in the metadata attribute list.
/// Values are left as raw JSON: ages are numbers, everything else strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataTrait {
    pub trait_type: String,
    pub value: serde_json::Value,
}

impl MetadataTrait {
    pub fn new(trait_type: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        MetadataTrait {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
