//! The executor for the ingestion pipeline
//!
//! Blocks are processed in strictly ascending order; within an invocation a
//! block's records and the cursor update commit as one atomic unit before
//! the next block is touched. Cancellation is honored at block boundaries
//! only, since a block-level commit cannot be partially honored

use std::time::Duration;

use alloy_primitives::{B256, TxHash};
use backoff::ExponentialBackoff;
use bennee_client::decode_event;
use bennee_client::errors::{EventDecodingError, LogSourceError};
use bennee_client::traits::LogSource;
use common::types::{
    BlockNumber,
    events::RawLogEvent,
    record::PersistedRecord,
};
use state::RecordStore;
use tracing::{debug, info, instrument, warn};

use crate::error::IngestionError;
use crate::worker::IngestionWorkerConfig;

// -------------
// | Constants |
// -------------

/// The interval between head polls when the pipeline is caught up
const CAUGHT_UP_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// The initial delay when retrying a transient source failure
const FETCH_RETRY_INITIAL_INTERVAL: Duration = Duration::from_millis(400);
/// The maximum total time to retry a transient source failure for
const FETCH_RETRY_MAX_ELAPSED_TIME: Duration = Duration::from_secs(60);

/// Metric recording the number of logs skipped for unknown signatures
const NUM_SKIPPED_LOGS_METRIC: &str = "num_unknown_logs_skipped";
/// Metric recording the number of malformed events encountered
const NUM_MALFORMED_EVENTS_METRIC: &str = "num_malformed_events";

// ----------
// | Report |
// ----------

/// A log skipped because its signature matches no tracked event kind
#[derive(Clone, Debug)]
pub struct SkippedLog {
    /// The block the log was emitted in
    pub block_number: BlockNumber,
    /// The transaction that emitted the log
    pub transaction_hash: TxHash,
    /// The index of the log within its transaction
    pub log_index: u64,
    /// The unrecognized signature topic
    pub topic0: B256,
}

/// The outcome of a single pipeline invocation
#[derive(Clone, Debug, Default)]
pub struct IngestionReport {
    /// The final committed block, if the invocation committed any
    pub last_committed_block: Option<BlockNumber>,
    /// The logs skipped for unknown signatures, for observability
    pub skipped: Vec<SkippedLog>,
}

// ------------
// | Executor |
// ------------

/// The executor that drives the decode-build-persist flow for contiguous
/// block ranges
///
/// Only one invocation may run at a time for a given store; callers
/// serialize invocations, since concurrent unordered writes would violate
/// the ascending-commit invariant
pub struct IngestionExecutor<L: LogSource, S: RecordStore> {
    /// A copy of the config that the executor maintains
    config: IngestionWorkerConfig<L, S>,
}

impl<L: LogSource, S: RecordStore> IngestionExecutor<L, S> {
    /// Create a new executor
    pub fn new(config: IngestionWorkerConfig<L, S>) -> Self {
        Self { config }
    }

    /// Shorthand for fetching a reference to the log source
    fn source(&self) -> &L {
        self.config.source.as_ref()
    }

    /// Shorthand for fetching a reference to the record store
    fn store(&self) -> &S {
        self.config.store.as_ref()
    }

    /// The main execution loop for the executor; follows the source's head,
    /// ingesting as blocks become available
    pub async fn execute(self) -> Result<(), IngestionError> {
        info!("starting ingestion pipeline from block {}", self.config.genesis_block);
        let mut cancel = self.config.cancel_channel.clone();

        loop {
            let next = self.next_block()?;
            match self.source().latest_block().await {
                Ok(head) if head >= next => {
                    let report = self.ingest_range(next, head).await?;
                    if let Some(committed) = report.last_committed_block {
                        info!(
                            "ingested through block {committed} ({} unknown logs skipped)",
                            report.skipped.len()
                        );
                    }
                },
                // Already caught up
                Ok(_) => {},
                // A transient failure here costs one poll interval, nothing
                // more
                Err(e) => warn!("error fetching source head: {e}"),
            }

            // Caught up; wait for new blocks or a cancel signal
            tokio::select! {
                _ = tokio::time::sleep(CAUGHT_UP_POLL_INTERVAL) => {},
                _ = cancel.changed() => {
                    info!("ingestion pipeline received cancel signal");
                    return Err(IngestionError::Cancelled);
                }
            }
        }
    }

    /// Ingest a contiguous range of blocks, inclusive on both ends
    ///
    /// The range must abut the cursor: `from_block` may not skip past the
    /// next unprocessed block. Re-requesting already-committed blocks is a
    /// safe no-op per record. A block whose logs have not yet reached the
    /// source ends the invocation early with the progress made so far
    #[instrument(skip(self))]
    pub async fn ingest_range(
        &self,
        from_block: BlockNumber,
        to_block: BlockNumber,
    ) -> Result<IngestionReport, IngestionError> {
        if from_block > to_block {
            return Err(IngestionError::InvalidRange { from_block, to_block });
        }

        // The gap check happens before any fetch: a range starting past the
        // next unprocessed block means blocks are missing and must be
        // backfilled, never silently skipped. A first-ever run must start
        // exactly at the genesis block; afterwards, re-requesting committed
        // blocks is a permitted replay
        let cursor = self.store().cursor()?;
        let expected = cursor.map_or(self.config.genesis_block, |committed| committed + 1);
        let gap = if cursor.is_some() { from_block > expected } else { from_block != expected };
        if gap {
            return Err(IngestionError::CursorGap { expected, requested: from_block });
        }

        let mut report = IngestionReport::default();
        for block_number in from_block..=to_block {
            if self.cancelled() {
                info!("cancelled at block boundary {block_number}");
                return Err(IngestionError::Cancelled);
            }

            let logs = match self.fetch_logs_with_retry(block_number).await {
                Ok(logs) => logs,
                // The source has not seen this block yet; stop here and let
                // the caller retry later
                Err(LogSourceError::BlockNotFound(_)) => {
                    debug!("block {block_number} not yet at source, stopping");
                    break;
                },
                Err(e) => return Err(e.into()),
            };

            let records = self.build_block_records(block_number, &logs, &mut report)?;
            self.store().upsert_block(block_number, &records)?;
            report.last_committed_block = Some(block_number);

            debug!("committed block {block_number} with {} records", records.len());
        }

        Ok(report)
    }

    // -----------
    // | Helpers |
    // -----------

    /// The next block the cursor expects: the block after the last committed
    /// one, or the configured genesis block on a fresh store
    fn next_block(&self) -> Result<BlockNumber, IngestionError> {
        let cursor = self.store().cursor()?;
        Ok(cursor.map_or(self.config.genesis_block, |committed| committed + 1))
    }

    /// Whether a cancel signal has been received
    ///
    /// A closed channel counts as cancellation; a worker must not outlive
    /// its coordinator
    fn cancelled(&self) -> bool {
        self.config.cancel_channel.has_changed().unwrap_or(true)
    }

    /// Decode a block's logs and build their records
    ///
    /// Unknown signatures are skipped and reported; a malformed log for a
    /// tracked kind aborts the block, leaving the cursor at the last
    /// committed block
    fn build_block_records(
        &self,
        block_number: BlockNumber,
        logs: &[RawLogEvent],
        report: &mut IngestionReport,
    ) -> Result<Vec<PersistedRecord>, IngestionError> {
        let mut records = Vec::with_capacity(logs.len());
        for raw in logs.iter() {
            match decode_event(raw) {
                Ok(event) => records.push(PersistedRecord::new(event, raw)),
                Err(EventDecodingError::UnknownSignature(topic0)) => {
                    metrics::counter!(NUM_SKIPPED_LOGS_METRIC).increment(1);
                    debug!("skipping log with unknown signature {topic0} in block {block_number}");
                    report.skipped.push(SkippedLog {
                        block_number,
                        transaction_hash: raw.transaction_hash,
                        log_index: raw.log_index,
                        topic0,
                    });
                },
                Err(e) => {
                    metrics::counter!(NUM_MALFORMED_EVENTS_METRIC).increment(1);
                    return Err(IngestionError::MalformedEvent {
                        block_number,
                        transaction_hash: raw.transaction_hash,
                        log_index: raw.log_index,
                        reason: e.to_string(),
                    });
                },
            }
        }

        Ok(records)
    }

    /// Fetch a block's logs, retrying transient source failures with
    /// exponential backoff
    ///
    /// Retries are safe: the same block is re-fetched and records upsert by
    /// stable identifier
    async fn fetch_logs_with_retry(
        &self,
        block_number: BlockNumber,
    ) -> Result<Vec<RawLogEvent>, LogSourceError> {
        let backoff = ExponentialBackoff {
            initial_interval: FETCH_RETRY_INITIAL_INTERVAL,
            max_elapsed_time: Some(FETCH_RETRY_MAX_ELAPSED_TIME),
            ..Default::default()
        };

        backoff::future::retry(backoff, || async {
            self.source().fetch_logs(block_number).await.map_err(|e| {
                if e.is_transient() {
                    debug!("retrying fetch of block {block_number}: {e}");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .await
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use alloy_primitives::{Address, B256, TxHash, U256};
    use alloy_sol_types::SolEvent;
    use bennee_client::abi;
    use bennee_client::mock::MockLogSource;
    use common::types::{
        events::{BenneeEvent, EventValue, RawLogEvent},
        new_cancel_channel,
        record::{PersistedRecord, record_id},
    };
    use state::storage::db::DB;
    use state::test_helpers::mock_db;
    use state::RecordStore;
    use tokio::sync::watch::Sender as WatchSender;

    use crate::error::IngestionError;
    use crate::worker::IngestionWorkerConfig;

    use super::IngestionExecutor;

    /// The genesis block used across tests
    const GENESIS: u64 = 10;

    // -----------
    // | Helpers |
    // -----------

    /// Build an executor over a mock source and a fresh store
    ///
    /// Returns the executor along with the cancel sender and shared handles
    /// to the source and store
    fn mock_executor() -> (
        IngestionExecutor<MockLogSource, DB>,
        WatchSender<()>,
        Arc<MockLogSource>,
        Arc<DB>,
    ) {
        let (cancel_sender, cancel_channel) = new_cancel_channel();
        let source = Arc::new(MockLogSource::new());
        let store = Arc::new(mock_db());

        let config = IngestionWorkerConfig {
            genesis_block: GENESIS,
            source: source.clone(),
            store: store.clone(),
            cancel_channel,
        };

        (IngestionExecutor::new(config), cancel_sender, source, store)
    }

    /// Build a raw borrowed log at the given position
    fn borrowed_log(block_number: u64, tx_byte: u8, log_index: u64) -> RawLogEvent {
        RawLogEvent {
            block_number,
            block_timestamp: 1_700_000_000 + block_number,
            transaction_hash: TxHash::from([tx_byte; 32]),
            log_index,
            address: Address::from([0x0b; 20]),
            topic0: abi::Borrowed::SIGNATURE_HASH,
            params: vec![
                EventValue::Address(Address::from([0x01; 20])),
                EventValue::Uint(U256::from(234)),
            ],
        }
    }

    /// Build a raw withdraw log at the given position
    fn withdraw_log(block_number: u64, tx_byte: u8, log_index: u64) -> RawLogEvent {
        RawLogEvent {
            block_number,
            block_timestamp: 1_700_000_000 + block_number,
            transaction_hash: TxHash::from([tx_byte; 32]),
            log_index,
            address: Address::from([0x0b; 20]),
            topic0: abi::Withdraw::SIGNATURE_HASH,
            params: vec![
                EventValue::Address(Address::from([0x01; 20])),
                EventValue::Uint(U256::from(7)),
                EventValue::Address(Address::from([0x02; 20])),
                EventValue::Uint(U256::from(500)),
            ],
        }
    }

    // ---------
    // | Tests |
    // ---------

    /// Tests ingesting a block containing one borrow log end to end
    #[tokio::test]
    async fn test_ingest_borrowed_block() {
        let (executor, _cancel, source, store) = mock_executor();
        let log = borrowed_log(GENESIS, 0xaa, 1 /* log_index */);
        source.add_block(GENESIS, vec![log.clone()]);

        let report = executor.ingest_range(GENESIS, GENESIS).await.unwrap();
        assert_eq!(report.last_committed_block, Some(GENESIS));
        assert!(report.skipped.is_empty());

        // The record carries the event fields and the log's metadata
        let id = record_id(&log.transaction_hash, log.log_index);
        let record = store.get_record(&id).unwrap().unwrap();
        assert_eq!(
            record.event,
            BenneeEvent::Borrowed {
                by: Address::from([0x01; 20]),
                borrow_index: U256::from(234),
            }
        );
        assert_eq!(record.block_number, GENESIS);
        assert_eq!(store.cursor().unwrap(), Some(GENESIS));
    }

    /// Tests that ingesting the same block twice leaves the store unchanged
    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let (executor, _cancel, source, store) = mock_executor();
        let log = borrowed_log(GENESIS, 0xaa, 1);
        source.add_block(GENESIS, vec![log.clone()]);

        executor.ingest_range(GENESIS, GENESIS).await.unwrap();
        let count_before = store.record_count().unwrap();
        let record_before =
            store.get_record(&record_id(&log.transaction_hash, log.log_index)).unwrap();

        // Replaying the committed block is permitted and changes nothing
        executor.ingest_range(GENESIS, GENESIS).await.unwrap();
        assert_eq!(store.record_count().unwrap(), count_before);
        assert_eq!(
            store.get_record(&record_id(&log.transaction_hash, log.log_index)).unwrap(),
            record_before
        );
        assert_eq!(store.cursor().unwrap(), Some(GENESIS));
    }

    /// Tests that an unrecognized signature is skipped while the rest of the
    /// block persists
    #[tokio::test]
    async fn test_unknown_signature_skipped() {
        let (executor, _cancel, source, store) = mock_executor();

        let mut unknown = borrowed_log(GENESIS, 0xaa, 0);
        unknown.topic0 = B256::from([0x42; 32]);
        let withdraw = withdraw_log(GENESIS, 0xaa, 1);
        source.add_block(GENESIS, vec![unknown, withdraw.clone()]);

        let report = executor.ingest_range(GENESIS, GENESIS).await.unwrap();

        // Exactly one record persisted; the unknown log is reported
        assert_eq!(store.record_count().unwrap(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].log_index, 0);
        assert_eq!(report.skipped[0].topic0, B256::from([0x42; 32]));

        let id = record_id(&withdraw.transaction_hash, withdraw.log_index);
        assert!(store.get_record(&id).unwrap().is_some());
        assert_eq!(store.cursor().unwrap(), Some(GENESIS));
    }

    /// Tests that a parameter count mismatch withholds the whole block and
    /// leaves the cursor at the prior block
    #[tokio::test]
    async fn test_malformed_event_withholds_block() {
        let (executor, _cancel, source, store) = mock_executor();

        // Commit one good block first
        source.add_block(GENESIS, vec![borrowed_log(GENESIS, 0xaa, 0)]);
        executor.ingest_range(GENESIS, GENESIS).await.unwrap();

        // The next block holds a valid log and a truncated withdraw log
        let mut truncated = withdraw_log(GENESIS + 1, 0xbb, 1);
        truncated.params.pop();
        let valid = borrowed_log(GENESIS + 1, 0xbb, 0);
        source.add_block(GENESIS + 1, vec![valid.clone(), truncated.clone()]);

        let err = executor.ingest_range(GENESIS + 1, GENESIS + 1).await.unwrap_err();
        assert!(matches!(
            err,
            IngestionError::MalformedEvent { block_number, log_index: 1, .. }
                if block_number == GENESIS + 1
        ));

        // Nothing from the bad block is visible, the cursor is unmoved
        assert_eq!(store.cursor().unwrap(), Some(GENESIS));
        assert_eq!(store.record_count().unwrap(), 1);
        let valid_id = record_id(&valid.transaction_hash, valid.log_index);
        assert_eq!(store.get_record(&valid_id).unwrap(), None);
    }

    /// Tests that a range starting past the next expected block fails before
    /// any fetch occurs
    #[tokio::test]
    async fn test_cursor_gap_before_fetch() {
        let (executor, _cancel, source, store) = mock_executor();
        source.add_block(GENESIS, vec![borrowed_log(GENESIS, 0xaa, 0)]);
        executor.ingest_range(GENESIS, GENESIS).await.unwrap();

        let calls_before = source.fetch_calls();
        let err = executor.ingest_range(GENESIS + 2, GENESIS + 3).await.unwrap_err();
        assert!(matches!(
            err,
            IngestionError::CursorGap { expected, requested }
                if expected == GENESIS + 1 && requested == GENESIS + 2
        ));

        assert_eq!(source.fetch_calls(), calls_before);
        assert_eq!(store.cursor().unwrap(), Some(GENESIS));
    }

    /// Tests that a first-ever run must start exactly at the genesis block
    #[tokio::test]
    async fn test_first_run_requires_genesis() {
        let (executor, _cancel, source, _store) = mock_executor();
        source.set_latest_block(GENESIS + 5);

        // Starting below genesis is as much a gap as starting above it
        for from_block in [GENESIS - 1, GENESIS + 1] {
            let err = executor.ingest_range(from_block, GENESIS + 1).await.unwrap_err();
            assert!(matches!(
                err,
                IngestionError::CursorGap { expected, requested }
                    if expected == GENESIS && requested == from_block
            ));
        }
        assert_eq!(source.fetch_calls(), 0);
    }

    /// Tests that an inverted range is rejected
    #[tokio::test]
    async fn test_invalid_range() {
        let (executor, _cancel, _source, _store) = mock_executor();
        let err = executor.ingest_range(GENESIS + 1, GENESIS).await.unwrap_err();

        assert!(matches!(err, IngestionError::InvalidRange { .. }));
    }

    /// Tests that transient source failures are retried until the fetch
    /// succeeds
    #[tokio::test]
    async fn test_transient_failure_retried() {
        let (executor, _cancel, source, store) = mock_executor();
        source.add_block(GENESIS, vec![borrowed_log(GENESIS, 0xaa, 0)]);
        source.fail_fetches(2);

        let report = executor.ingest_range(GENESIS, GENESIS).await.unwrap();
        assert_eq!(report.last_committed_block, Some(GENESIS));
        assert_eq!(store.record_count().unwrap(), 1);
        assert!(source.fetch_calls() >= 3);
    }

    /// Tests that a block missing at the source ends the run with the
    /// progress made so far
    #[tokio::test]
    async fn test_block_not_found_stops_run() {
        let (executor, _cancel, source, store) = mock_executor();
        source.add_block(GENESIS, vec![borrowed_log(GENESIS, 0xaa, 0)]);

        // Request past the mock's latest block
        let report = executor.ingest_range(GENESIS, GENESIS + 2).await.unwrap();
        assert_eq!(report.last_committed_block, Some(GENESIS));
        assert_eq!(store.cursor().unwrap(), Some(GENESIS));
    }

    /// Tests that ingesting multiple blocks commits them in ascending order
    /// with per-block cursor advancement
    #[tokio::test]
    async fn test_multi_block_range() {
        let (executor, _cancel, source, store) = mock_executor();
        source.add_block(GENESIS, vec![borrowed_log(GENESIS, 0xaa, 0)]);
        // GENESIS + 1 has no logs of interest
        source.add_block(GENESIS + 2, vec![withdraw_log(GENESIS + 2, 0xcc, 0)]);

        let report = executor.ingest_range(GENESIS, GENESIS + 2).await.unwrap();
        assert_eq!(report.last_committed_block, Some(GENESIS + 2));
        assert_eq!(store.cursor().unwrap(), Some(GENESIS + 2));
        assert_eq!(store.record_count().unwrap(), 2);
    }

    /// Tests that a cancel signal stops the run at a block boundary
    #[tokio::test]
    async fn test_cancellation() {
        let (executor, cancel_sender, source, store) = mock_executor();
        source.add_block(GENESIS, vec![borrowed_log(GENESIS, 0xaa, 0)]);

        cancel_sender.send(()).unwrap();
        let err = executor.ingest_range(GENESIS, GENESIS).await.unwrap_err();

        assert!(matches!(err, IngestionError::Cancelled));
        assert_eq!(store.cursor().unwrap(), None);
        assert_eq!(store.record_count().unwrap(), 0);
    }
}
