//! Trait definitions for the log sources the ingestion pipeline consumes

use async_trait::async_trait;
use common::types::{BlockNumber, events::RawLogEvent};

use crate::errors::LogSourceError;

/// A source of raw contract log events, one block at a time
///
/// Implementations guarantee that the logs returned for a block are ordered
/// by ascending log index
#[async_trait]
pub trait LogSource: Send + Sync {
    /// The latest block number the source has seen
    async fn latest_block(&self) -> Result<BlockNumber, LogSourceError>;

    /// Fetch the raw log events the tracked contract emitted in the given
    /// block, in ascending log-index order
    async fn fetch_logs(
        &self,
        block_number: BlockNumber,
    ) -> Result<Vec<RawLogEvent>, LogSourceError>;
}
