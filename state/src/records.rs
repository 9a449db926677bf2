//! The record store interface over the database: idempotent block-batch
//! upserts, cursor tracking, and derived views over the stored records

use alloy_primitives::Address;
use common::types::{
    BlockNumber,
    events::BenneeEvent,
    record::PersistedRecord,
};
use tracing::instrument;

use crate::storage::{db::DB, error::StorageError};
use crate::{INGESTION_METADATA_TABLE, RECORDS_TABLE};

/// The metadata key under which the ingestion cursor is stored
const CURSOR_KEY: &str = "ingestion-cursor";

/// The storage interface the ingestion pipeline writes through
///
/// A block's records and the cursor update are applied as one atomic unit:
/// after a crash either the whole block is visible and the cursor reflects
/// it, or neither does
pub trait RecordStore {
    /// The highest block number fully ingested, or `None` if no block has
    /// ever been committed
    fn cursor(&self) -> Result<Option<BlockNumber>, StorageError>;

    /// Upsert all records for a block and advance the cursor to that block,
    /// atomically
    ///
    /// Upserting a record id that already exists verifies the stored record
    /// is identical; a conflicting overwrite fails the whole batch
    fn upsert_block(
        &self,
        block_number: BlockNumber,
        records: &[PersistedRecord],
    ) -> Result<(), StorageError>;

    /// Point lookup of a record by its id
    fn get_record(&self, id: &str) -> Result<Option<PersistedRecord>, StorageError>;

    /// The total number of stored records
    fn record_count(&self) -> Result<u64, StorageError>;
}

impl RecordStore for DB {
    fn cursor(&self) -> Result<Option<BlockNumber>, StorageError> {
        self.read(INGESTION_METADATA_TABLE, &CURSOR_KEY.to_string())
    }

    #[instrument(skip(self, records), fields(n_records = records.len()))]
    fn upsert_block(
        &self,
        block_number: BlockNumber,
        records: &[PersistedRecord],
    ) -> Result<(), StorageError> {
        let tx = self.new_write_tx()?;
        for record in records.iter() {
            // A record is write-once per id; a second write must carry
            // identical contents
            if let Some(existing) = tx.read::<_, PersistedRecord>(RECORDS_TABLE, &record.id)? {
                if existing != *record {
                    return Err(StorageError::ConflictingRecord(record.id.clone()));
                }
                continue;
            }

            tx.write(RECORDS_TABLE, &record.id, record)?;
        }

        // The cursor update rides in the same transaction as the batch; a
        // replayed block never moves it backwards
        let cursor: Option<BlockNumber> =
            tx.read(INGESTION_METADATA_TABLE, &CURSOR_KEY.to_string())?;
        let new_cursor = cursor.map_or(block_number, |c| BlockNumber::max(c, block_number));

        tx.write(INGESTION_METADATA_TABLE, &CURSOR_KEY.to_string(), &new_cursor)?;
        tx.commit()
    }

    fn get_record(&self, id: &str) -> Result<Option<PersistedRecord>, StorageError> {
        self.read(RECORDS_TABLE, &id.to_string())
    }

    fn record_count(&self) -> Result<u64, StorageError> {
        let tx = self.new_read_tx()?;
        let count = tx.count(RECORDS_TABLE)?;
        tx.commit()?;

        Ok(count)
    }
}

// -----------------
// | Derived Views |
// -----------------

/// Views derived from the append-only records at query time
///
/// Role-holding state (owner, signer, fx scheduler) is never mutated in
/// place; the current holder is whatever the latest relevant record says
impl DB {
    /// The current contract owner, if any ownership transfer has completed
    pub fn latest_owner(&self) -> Result<Option<Address>, StorageError> {
        self.latest_by(|event| match event {
            BenneeEvent::OwnershipTransferred { new_owner, .. } => Some(*new_owner),
            _ => None,
        })
    }

    /// The current attestation signer, if any signer update was recorded
    pub fn latest_signer(&self) -> Result<Option<Address>, StorageError> {
        self.latest_by(|event| match event {
            BenneeEvent::SignerUpdated { new_signer, .. } => Some(*new_signer),
            _ => None,
        })
    }

    /// The current fx scheduler, if any scheduler update was recorded
    pub fn latest_fx_scheduler(&self) -> Result<Option<Address>, StorageError> {
        self.latest_by(|event| match event {
            BenneeEvent::FxSchedulerUpdated { new_fx_scheduler, .. } => Some(*new_fx_scheduler),
            _ => None,
        })
    }

    /// Scan the records for the latest value a selector extracts, ordered by
    /// `(block_number, log_index)`
    fn latest_by<T, F: Fn(&BenneeEvent) -> Option<T>>(
        &self,
        selector: F,
    ) -> Result<Option<T>, StorageError> {
        let tx = self.new_read_tx()?;
        let records: Vec<PersistedRecord> = tx.read_all(RECORDS_TABLE)?;
        tx.commit()?;

        let latest = records
            .iter()
            .filter_map(|record| {
                selector(&record.event).map(|value| ((record.block_number, record.log_index), value))
            })
            .max_by_key(|(order, _value)| *order)
            .map(|(_order, value)| value);

        Ok(latest)
    }
}
