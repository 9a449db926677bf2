//! Defines the persisted record type written to the store for every decoded
//! event, and the construction of its stable identifier

use alloy_primitives::TxHash;
use serde::{Deserialize, Serialize};
use util::hex::bytes_to_hex_string;

use super::{
    BlockNumber,
    events::{BenneeEvent, RawLogEvent},
};

/// Derive the stable identifier for the record of a given log
///
/// The identifier is the hex encoding of the transaction hash bytes followed
/// by the log index as an 8-byte big-endian integer. Distinct
/// `(transaction_hash, log_index)` pairs therefore always map to distinct
/// identifiers, and re-ingesting the same chain data reproduces the same id
pub fn record_id(transaction_hash: &TxHash, log_index: u64) -> String {
    let mut bytes = transaction_hash.to_vec();
    bytes.extend_from_slice(&log_index.to_be_bytes());
    bytes_to_hex_string(&bytes)
}

/// A persisted record of a single decoded contract event
///
/// Records are write-once per identifier; a second write with the same id
/// must carry identical contents
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    /// The stable identifier of the record, see [`record_id`]
    pub id: String,
    /// The decoded event the record was built from
    pub event: BenneeEvent,
    /// The number of the block the event was emitted in
    pub block_number: BlockNumber,
    /// The timestamp of the block the event was emitted in
    pub block_timestamp: u64,
    /// The hash of the transaction that emitted the event
    pub transaction_hash: TxHash,
    /// The index of the log within its transaction
    pub log_index: u64,
}

impl PersistedRecord {
    /// Build the record for a decoded event and the raw log it came from
    ///
    /// Copies the block and transaction metadata from the raw log verbatim
    pub fn new(event: BenneeEvent, raw: &RawLogEvent) -> Self {
        Self {
            id: record_id(&raw.transaction_hash, raw.log_index),
            event,
            block_number: raw.block_number,
            block_timestamp: raw.block_timestamp,
            transaction_hash: raw.transaction_hash,
            log_index: raw.log_index,
        }
    }
}
