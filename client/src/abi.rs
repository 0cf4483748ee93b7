//! Minimal ABI codec for the contract entry points this client consumes.
//!
//! Covers exactly what the jar factory, jars, the token, and the collection
//! expose: `address`, `uint256` (within `u128`), `uint8` (as a `uint256`
//! word), `string`, and `address[]`. Signatures are passed in canonical form
//! (no spaces, no parameter names), and selectors/topics are Keccak-256 per
//! the contract ABI convention.

use sha3::{Digest, Keccak256};

use crate::errors::{ClientError, Result};
use crate::types::Address;

const WORD: usize = 32;

/// One encodable call argument.
#[derive(Debug, Clone)]
pub enum AbiValue {
    Address(Address),
    Uint(u128),
    Str(String),
}

// ─────────────────────────────────────────────────────────
// Selectors and topics
// ─────────────────────────────────────────────────────────

/// First four bytes of the Keccak-256 of a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Full 32-byte signature hash as a `0x`-prefixed hex topic string.
pub fn event_topic(signature: &str) -> String {
    let digest = Keccak256::digest(signature.as_bytes());
    format!("0x{}", hex::encode(digest))
}

// ─────────────────────────────────────────────────────────
// Call encoding
// ─────────────────────────────────────────────────────────

/// Encode a contract call as `0x`-prefixed calldata hex.
///
/// Static arguments occupy one head word each; strings put an offset in the
/// head and their length-prefixed, zero-padded bytes in the tail.
pub fn encode_call(signature: &str, args: &[AbiValue]) -> String {
    let head_len = args.len() * WORD;
    let mut head: Vec<u8> = Vec::with_capacity(head_len);
    let mut tail: Vec<u8> = Vec::new();

    for arg in args {
        match arg {
            AbiValue::Address(addr) => head.extend_from_slice(&address_word(addr)),
            AbiValue::Uint(n) => head.extend_from_slice(&uint_word(*n)),
            AbiValue::Str(s) => {
                let offset = (head_len + tail.len()) as u128;
                head.extend_from_slice(&uint_word(offset));
                let bytes = s.as_bytes();
                tail.extend_from_slice(&uint_word(bytes.len() as u128));
                tail.extend_from_slice(bytes);
                tail.resize(tail.len() + pad_len(bytes.len()), 0);
            }
        }
    }

    let mut out = Vec::with_capacity(4 + head_len + tail.len());
    out.extend_from_slice(&selector(signature));
    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
    format!("0x{}", hex::encode(out))
}

fn pad_len(len: usize) -> usize {
    (WORD - len % WORD) % WORD
}

fn uint_word(n: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&n.to_be_bytes());
    word
}

fn address_word(addr: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(addr.as_bytes());
    word
}

// ─────────────────────────────────────────────────────────
// Return-value decoding
// ─────────────────────────────────────────────────────────

/// Decode a single `uint256` return value into a `u128`.
pub fn decode_uint(data: &str) -> Result<u128> {
    let bytes = hex_bytes(data)?;
    uint_from_word(word_at(&bytes, 0)?)
}

/// Decode a single `address` return value.
pub fn decode_address(data: &str) -> Result<Address> {
    let bytes = hex_bytes(data)?;
    address_from_word(word_at(&bytes, 0)?)
}

/// Decode a single `string` return value.
pub fn decode_string(data: &str) -> Result<String> {
    let bytes = hex_bytes(data)?;
    let offset = uint_from_word(word_at(&bytes, 0)?)? as usize;
    dynamic_string_at(&bytes, offset)
}

/// Decode a single `address[]` return value.
pub fn decode_address_array(data: &str) -> Result<Vec<Address>> {
    let bytes = hex_bytes(data)?;
    let offset = uint_from_word(word_at(&bytes, 0)?)? as usize;
    if offset % WORD != 0 {
        return Err(ClientError::Codec(format!("Misaligned array offset {offset}")));
    }
    let len = uint_from_word(slice_word(&bytes, offset)?)? as usize;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        out.push(address_from_word(slice_word(&bytes, offset + WORD * (i + 1))?)?);
    }
    Ok(out)
}

fn dynamic_string_at(bytes: &[u8], offset: usize) -> Result<String> {
    let len = uint_from_word(slice_word(bytes, offset)?)? as usize;
    let start = offset + WORD;
    let end = start
        .checked_add(len)
        .filter(|&e| e <= bytes.len())
        .ok_or_else(|| ClientError::Codec("String runs past end of data".to_string()))?;
    String::from_utf8(bytes[start..end].to_vec())
        .map_err(|_| ClientError::Codec("String payload is not valid UTF-8".to_string()))
}

// ─────────────────────────────────────────────────────────
// Topic words (indexed event parameters)
// ─────────────────────────────────────────────────────────

/// Decode one 32-byte topic as an address.
pub fn decode_topic_address(topic: &str) -> Result<Address> {
    let bytes = hex_bytes(topic)?;
    address_from_word(word_at(&bytes, 0)?)
}

/// Decode one 32-byte topic as a `uint256` within `u128`.
pub fn decode_topic_uint(topic: &str) -> Result<u128> {
    let bytes = hex_bytes(topic)?;
    uint_from_word(word_at(&bytes, 0)?)
}

// ─────────────────────────────────────────────────────────
// Word-level helpers
// ─────────────────────────────────────────────────────────

pub(crate) fn hex_bytes(data: &str) -> Result<Vec<u8>> {
    let stripped = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(stripped).map_err(|_| ClientError::Codec(format!("Invalid hex payload: {data}")))
}

fn word_at(bytes: &[u8], index: usize) -> Result<&[u8]> {
    slice_word(bytes, index * WORD)
}

fn slice_word(bytes: &[u8], start: usize) -> Result<&[u8]> {
    let end = start.checked_add(WORD).filter(|&e| e <= bytes.len());
    match end {
        Some(end) => Ok(&bytes[start..end]),
        None => Err(ClientError::Codec(format!(
            "Response too short: need word at byte {start}, have {} bytes",
            bytes.len()
        ))),
    }
}

fn uint_from_word(word: &[u8]) -> Result<u128> {
    if word[..16].iter().any(|&b| b != 0) {
        return Err(ClientError::Codec(
            "uint256 value exceeds the supported u128 range".to_string(),
        ));
    }
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(buf))
}

fn address_from_word(word: &[u8]) -> Result<Address> {
    if word[..12].iter().any(|&b| b != 0) {
        return Err(ClientError::Codec(
            "Address word has nonzero padding".to_string(),
        ));
    }
    let mut buf = [0u8; 20];
    buf.copy_from_slice(&word[12..]);
    Ok(Address::from_bytes(buf))
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
