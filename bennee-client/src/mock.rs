//! A mock log source serving canned logs from memory, used to exercise the
//! ingestion pipeline in tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use common::types::{BlockNumber, events::RawLogEvent};

use crate::errors::LogSourceError;
use crate::traits::LogSource;

/// The error message attached to injected transient failures
const ERR_INJECTED_FAILURE: &str = "injected mock failure";

/// A log source serving canned per-block logs from memory
///
/// Blocks not explicitly added serve an empty log list as long as they are at
/// or below the configured latest block; blocks above it are not found
#[derive(Default)]
pub struct MockLogSource {
    /// The canned logs, keyed by block number
    blocks: Mutex<HashMap<BlockNumber, Vec<RawLogEvent>>>,
    /// The latest block the mock reports
    latest_block: Mutex<BlockNumber>,
    /// The number of fetches that fail with a transient error before
    /// fetches succeed again
    transient_failures: Mutex<usize>,
    /// The number of times `fetch_logs` has been called
    fetch_calls: Mutex<usize>,
}

impl MockLogSource {
    /// Create a new empty mock source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the canned logs for a block, bumping the latest block if needed
    pub fn add_block(&self, block_number: BlockNumber, logs: Vec<RawLogEvent>) {
        self.blocks.lock().unwrap().insert(block_number, logs);

        let mut latest = self.latest_block.lock().unwrap();
        *latest = BlockNumber::max(*latest, block_number);
    }

    /// Set the latest block the mock reports
    pub fn set_latest_block(&self, block_number: BlockNumber) {
        *self.latest_block.lock().unwrap() = block_number;
    }

    /// Make the next `n` fetches fail with a transient error
    pub fn fail_fetches(&self, n: usize) {
        *self.transient_failures.lock().unwrap() = n;
    }

    /// The number of times `fetch_logs` has been called
    pub fn fetch_calls(&self) -> usize {
        *self.fetch_calls.lock().unwrap()
    }
}

#[async_trait]
impl LogSource for MockLogSource {
    async fn latest_block(&self) -> Result<BlockNumber, LogSourceError> {
        Ok(*self.latest_block.lock().unwrap())
    }

    async fn fetch_logs(
        &self,
        block_number: BlockNumber,
    ) -> Result<Vec<RawLogEvent>, LogSourceError> {
        *self.fetch_calls.lock().unwrap() += 1;

        {
            let mut failures = self.transient_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(LogSourceError::source_unavailable(ERR_INJECTED_FAILURE));
            }
        }

        if block_number > *self.latest_block.lock().unwrap() {
            return Err(LogSourceError::BlockNotFound(block_number));
        }

        Ok(self.blocks.lock().unwrap().get(&block_number).cloned().unwrap_or_default())
    }
}
