//! This crate defines the indexer's durable storage layer
//!
//! Decoded event records and the ingestion cursor live in an embedded
//! database using `libmdbx` as the underlying storage engine. A block's
//! record batch and the cursor update commit in a single transaction, which
//! gives the all-or-nothing semantics the ingestion pipeline relies on

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod records;
pub mod storage;

pub use records::RecordStore;

/// The number of tables to allocate in the database
pub(crate) const NUM_TABLES: usize = 2;

/// The name of the table holding persisted event records, keyed by record id
pub const RECORDS_TABLE: &str = "bennee-records";
/// The name of the table holding ingestion metadata, i.e. the cursor
pub const INGESTION_METADATA_TABLE: &str = "ingestion-metadata";

#[cfg(any(test, feature = "mocks"))]
pub mod test_helpers {
    //! Helpers for constructing mock storage instances in tests

    use tempfile::tempdir;

    use crate::storage::db::{DB, DbConfig};

    /// Get a tempdir to open the DB at
    pub fn tmp_db_path() -> String {
        let tempdir = tempdir().unwrap();
        tempdir.into_path().to_str().unwrap().to_string()
    }

    /// Create a mock database in a temporary location
    pub fn mock_db() -> DB {
        let path = tmp_db_path();
        let config = DbConfig { path };

        DB::new(&config).unwrap()
    }
}
