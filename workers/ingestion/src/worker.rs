//! Defines the worker implementation for the ingestion pipeline

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use bennee_client::traits::LogSource;
use common::types::{BlockNumber, CancelChannel};
use common::worker::Worker;
use state::RecordStore;
use tokio::runtime::Builder as TokioBuilder;
use util::err_str;

use crate::error::IngestionError;
use crate::executor::IngestionExecutor;

/// The error message emitted when a worker is started twice
const ERR_ALREADY_STARTED: &str = "ingestion worker already started";

// ----------
// | Config |
// ----------

/// The configuration passed to the ingestion worker upon startup
pub struct IngestionWorkerConfig<L: LogSource, S: RecordStore> {
    /// The first block to ingest when the store holds no cursor
    pub genesis_block: BlockNumber,
    /// The log source serving the tracked contract's logs
    pub source: Arc<L>,
    /// The record store the pipeline writes through
    pub store: Arc<S>,
    /// The channel on which the coordinator may send a cancel signal
    pub cancel_channel: CancelChannel,
}

// ----------
// | Worker |
// ----------

/// The worker responsible for ingesting the tracked contract's event logs
/// into the record store
pub struct IngestionWorker<L: LogSource, S: RecordStore> {
    /// The executor run in a separate thread, taken at startup
    executor: Option<IngestionExecutor<L, S>>,
    /// The thread handle of the executor
    handle: Option<JoinHandle<IngestionError>>,
}

#[async_trait]
impl<L, S> Worker for IngestionWorker<L, S>
where
    L: LogSource + 'static,
    S: RecordStore + Send + Sync + 'static,
{
    type WorkerConfig = IngestionWorkerConfig<L, S>;
    type Error = IngestionError;

    async fn new(config: Self::WorkerConfig) -> Result<Self, Self::Error> {
        Ok(Self { executor: Some(IngestionExecutor::new(config)), handle: None })
    }

    fn name(&self) -> String {
        "ingestion".to_string()
    }

    fn is_recoverable(&self) -> bool {
        // The cursor is durable, so a restarted worker resumes where the
        // last one committed
        true
    }

    fn start(&mut self) -> Result<(), Self::Error> {
        let executor =
            self.executor.take().ok_or(IngestionError::Setup(ERR_ALREADY_STARTED.to_string()))?;

        // Build a tokio runtime to drive the executor
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .map_err(err_str!(IngestionError::Setup))?;

        let handle = thread::Builder::new()
            .name("ingestion-executor".to_string())
            .spawn(move || runtime.block_on(executor.execute()).err().unwrap())
            .map_err(err_str!(IngestionError::Setup))?;

        self.handle = Some(handle);
        Ok(())
    }

    fn join(&mut self) -> JoinHandle<Self::Error> {
        self.handle.take().unwrap()
    }

    fn cleanup(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use alloy_primitives::{Address, TxHash, U256};
    use alloy_sol_types::SolEvent;
    use bennee_client::abi;
    use bennee_client::mock::MockLogSource;
    use common::types::{
        events::{EventValue, RawLogEvent},
        new_cancel_channel,
    };
    use common::worker::Worker;
    use state::RecordStore;
    use state::test_helpers::mock_db;

    use crate::error::IngestionError;

    use super::{IngestionWorker, IngestionWorkerConfig};

    /// How long to wait for the worker to make progress before failing
    const PROGRESS_TIMEOUT: Duration = Duration::from_secs(10);

    /// Tests the worker lifecycle: start, ingest to head, cancel, join
    #[tokio::test(flavor = "multi_thread")]
    async fn test_worker_lifecycle() {
        let (cancel_sender, cancel_channel) = new_cancel_channel();
        let source = Arc::new(MockLogSource::new());
        let store = Arc::new(mock_db());

        source.add_block(
            1,
            vec![RawLogEvent {
                block_number: 1,
                block_timestamp: 1_700_000_000,
                transaction_hash: TxHash::from([0xaa; 32]),
                log_index: 0,
                address: Address::from([0x0b; 20]),
                topic0: abi::Borrowed::SIGNATURE_HASH,
                params: vec![
                    EventValue::Address(Address::from([0x01; 20])),
                    EventValue::Uint(U256::from(1)),
                ],
            }],
        );

        let config = IngestionWorkerConfig {
            genesis_block: 1,
            source,
            store: store.clone(),
            cancel_channel,
        };
        let mut worker = IngestionWorker::new(config).await.unwrap();
        worker.start().unwrap();

        // Wait for the worker to commit the canned block
        let deadline = Instant::now() + PROGRESS_TIMEOUT;
        while store.cursor().unwrap() != Some(1) {
            assert!(Instant::now() < deadline, "worker made no progress");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(store.record_count().unwrap(), 1);

        // Cancel and join; the executor exits with a cancellation error
        cancel_sender.send(()).unwrap();
        let err = worker.join().join().unwrap();
        assert!(matches!(err, IngestionError::Cancelled));
    }
}
