//! Recognized contract events, decoded from receipt logs by name.
//!
//! The registry knows the handful of events this client cares about and maps
//! `topics[0]` back to them. Logs with unknown signatures, and recognized
//! signatures whose payload does not decode, are skipped quietly: an absent
//! event is information for the caller, never an error.

use tracing::debug;

use crate::abi;
use crate::types::{Address, TxLog, TxReceipt};

const TRANSFER_SIG: &str = "Transfer(address,address,uint256)";
const DONATION_SIG: &str = "DonationReceived(address,uint256)";

/// A decoded occurrence of a recognized event.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainEvent {
    /// ERC-721 transfer with all three parameters indexed. Mints arrive as a
    /// transfer from the zero address.
    Transfer {
        from: Address,
        to: Address,
        token_id: u128,
    },
    /// A jar accepting its one donation.
    DonationReceived { donor: Address, amount: u128 },
}

impl ChainEvent {
    /// The name this event is registered under.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "Transfer",
            Self::DonationReceived { .. } => "DonationReceived",
        }
    }
}

/// Decode every recognized event in a receipt, preserving log order.
pub fn decode_receipt(receipt: &TxReceipt) -> Vec<ChainEvent> {
    let transfer_topic = abi::event_topic(TRANSFER_SIG);
    let donation_topic = abi::event_topic(DONATION_SIG);
    receipt
        .logs
        .iter()
        .filter_map(|log| decode_log(log, &transfer_topic, &donation_topic))
        .collect()
}

/// The first event named `name` in the receipt, if any.
pub fn first_event(receipt: &TxReceipt, name: &str) -> Option<ChainEvent> {
    decode_receipt(receipt).into_iter().find(|e| e.name() == name)
}

fn decode_log(log: &TxLog, transfer_topic: &str, donation_topic: &str) -> Option<ChainEvent> {
    let signature = log.topics.first()?;
    if signature.eq_ignore_ascii_case(transfer_topic) {
        decode_transfer(log)
    } else if signature.eq_ignore_ascii_case(donation_topic) {
        decode_donation(log)
    } else {
        None
    }
}

fn decode_transfer(log: &TxLog) -> Option<ChainEvent> {
    // The fully-indexed ERC-721 form carries the token id as topics[3]. A
    // token-balance Transfer (three topics, amount in data) is a different
    // event for our purposes and is left undecoded.
    if log.topics.len() != 4 {
        return None;
    }
    let decoded = (|| {
        Some(ChainEvent::Transfer {
            from: abi::decode_topic_address(&log.topics[1]).ok()?,
            to: abi::decode_topic_address(&log.topics[2]).ok()?,
            token_id: abi::decode_topic_uint(&log.topics[3]).ok()?,
        })
    })();
    if decoded.is_none() {
        debug!(address = %log.address, "skipping Transfer log with undecodable topics");
    }
    decoded
}

fn decode_donation(log: &TxLog) -> Option<ChainEvent> {
    if log.topics.len() != 2 {
        return None;
    }
    let decoded = (|| {
        Some(ChainEvent::DonationReceived {
            donor: abi::decode_topic_address(&log.topics[1]).ok()?,
            amount: abi::decode_uint(&log.data).ok()?,
        })
    })();
    if decoded.is_none() {
        debug!(address = %log.address, "skipping DonationReceived log with undecodable payload");
    }
    decoded
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
