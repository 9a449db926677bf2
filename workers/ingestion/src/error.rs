//! Defines error types for the ingestion pipeline

use alloy_primitives::TxHash;
use bennee_client::errors::LogSourceError;
use common::types::BlockNumber;
use state::storage::error::StorageError;

/// The error type that the ingestion pipeline emits
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    /// The pipeline received a cancel signal at a block boundary
    #[error("ingestion cancelled")]
    Cancelled,
    /// The requested range starts past the next unprocessed block; the
    /// missing blocks must be backfilled externally rather than skipped
    #[error("cursor gap: next expected block is {expected}, requested range starts at {requested}")]
    CursorGap {
        /// The next block the cursor expects
        expected: BlockNumber,
        /// The first block of the requested range
        requested: BlockNumber,
    },
    /// The requested range is ill-formed
    #[error("invalid range: from block {from_block} is greater than to block {to_block}")]
    InvalidRange {
        /// The first block of the requested range
        from_block: BlockNumber,
        /// The last block of the requested range
        to_block: BlockNumber,
    },
    /// A log for a tracked event kind failed to decode; this indicates a
    /// decoder/schema mismatch, so the block is withheld rather than skipped
    #[error(
        "malformed event at block {block_number}, tx {transaction_hash:#x}, log index {log_index}: {reason}"
    )]
    MalformedEvent {
        /// The block the offending log was emitted in
        block_number: BlockNumber,
        /// The transaction that emitted the offending log
        transaction_hash: TxHash,
        /// The index of the offending log within its transaction
        log_index: u64,
        /// The decode failure
        reason: String,
    },
    /// An error setting up the ingestion worker
    #[error("error setting up the ingestion worker: {0}")]
    Setup(String),
    /// An error fetching logs from the log source
    #[error("log source error: {0}")]
    Source(#[from] LogSourceError),
    /// An error reading or writing the record store
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
