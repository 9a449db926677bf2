//! Defines the interface to the `mdbx` instance
//!
//! We serialize stored values using the `ciborium` CBOR implementation; keys
//! are serialized the same way so that string keys remain order-comparable

use std::{ops::Bound, path::Path};

use libmdbx::{Database, Geometry, RO, RW, WriteMap};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use util::err_str;

use crate::{INGESTION_METADATA_TABLE, NUM_TABLES, RECORDS_TABLE};

use super::{
    error::StorageError,
    traits::{Key, Value},
    tx::DbTxn,
};

/// The total maximum size of the DB in bytes
const MAX_DB_SIZE_BYTES: usize = 1 << 35; // 32 GB

// -----------
// | Helpers |
// -----------

/// Serialize a value to a CBOR byte vector
pub(crate) fn serialize_value<V: Serialize>(value: &V) -> Result<Vec<u8>, StorageError> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(value, &mut bytes)
        .map_err(err_str!(StorageError::Serialization))?;

    Ok(bytes)
}

/// Deserialize a value from a CBOR byte vector
pub(crate) fn deserialize_value<V: for<'de> Deserialize<'de>>(
    value_bytes: &[u8],
) -> Result<V, StorageError> {
    ciborium::de::from_reader(value_bytes).map_err(err_str!(StorageError::Deserialization))
}

// ------------
// | Database |
// ------------

/// The database config
pub struct DbConfig {
    /// The path to open the database at
    pub path: String,
}

impl DbConfig {
    /// Constructor
    pub fn new_with_path(path: &str) -> Self {
        Self { path: path.to_string() }
    }
}

/// The persistent storage layer for the indexer
///
/// Contains a reference to an `mdbx` instance
pub struct DB {
    /// The path that the DB is open at
    path: String,
    /// The underlying `mdbx` instance
    db: Database<WriteMap>,
}

impl DB {
    /// Constructor; opens the database and creates the indexer's tables
    pub fn new(config: &DbConfig) -> Result<Self, StorageError> {
        let db_path = Path::new(&config.path);
        let db_geom = Geometry {
            size: Some((Bound::Unbounded, Bound::Included(MAX_DB_SIZE_BYTES))),
            ..Default::default()
        };

        let db = Database::new()
            .set_max_tables(NUM_TABLES)
            .set_geometry(db_geom)
            .open(db_path)
            .map_err(StorageError::OpenDb)?;

        let this = Self { path: config.path.clone(), db };
        this.setup_tables()?;

        Ok(this)
    }

    /// Get the path that the DB is open at
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get a key from the database
    pub fn read<K: Key, V: Value>(
        &self,
        table_name: &str,
        key: &K,
    ) -> Result<Option<V>, StorageError> {
        let tx = self.new_read_tx()?;
        let val = tx.read(table_name, key)?;
        tx.commit()?;

        Ok(val)
    }

    /// Set a key in the database
    pub fn write<K: Key, V: Value>(
        &self,
        table_name: &str,
        key: &K,
        value: &V,
    ) -> Result<(), StorageError> {
        let tx = self.new_write_tx()?;
        tx.write(table_name, key, value)?;
        tx.commit()
    }

    /// Delete a key from the database
    ///
    /// Returns `true` if the key was present in the table
    pub fn delete<K: Key>(&self, table_name: &str, key: &K) -> Result<bool, StorageError> {
        let tx = self.new_write_tx()?;
        let did_exist = tx.delete(table_name, key)?;
        tx.commit()?;

        Ok(did_exist)
    }

    /// Create a new read-only transaction
    #[instrument(skip(self))]
    pub fn new_read_tx(&self) -> Result<DbTxn<'_, RO>, StorageError> {
        let txn = self.db.begin_ro_txn().map_err(StorageError::BeginTx)?;
        Ok(DbTxn::new(txn))
    }

    /// Create a new read-write transaction
    #[instrument(skip(self))]
    pub fn new_write_tx(&self) -> Result<DbTxn<'_, RW>, StorageError> {
        self.db.begin_rw_txn().map_err(StorageError::BeginTx).map(DbTxn::new)
    }

    /// Flush the database to disk
    pub fn sync(&self) -> Result<(), StorageError> {
        self.db.sync(true /* force */).map_err(StorageError::Sync).map(|_| ())
    }

    // -----------
    // | Helpers |
    // -----------

    /// Create the tables used by the indexer
    fn setup_tables(&self) -> Result<(), StorageError> {
        let tx = self.new_write_tx()?;
        for table in [RECORDS_TABLE, INGESTION_METADATA_TABLE].iter() {
            tx.create_table(table)?;
        }

        tx.commit()
    }
}

#[cfg(test)]
mod test {
    use serde::{Deserialize, Serialize};

    use crate::test_helpers::mock_db;

    use super::{DB, DbConfig};

    /// The table used for storage tests; tables are pre-allocated by the
    /// constructor, so tests reuse one of them
    const TABLE_NAME: &str = "bennee-records";

    // -----------
    // | Helpers |
    // -----------

    /// A structure to store for testing
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct TestValue {
        a: u64,
        b: Vec<String>,
    }

    impl TestValue {
        /// Get a dummy test value
        fn dummy() -> Self {
            Self { a: 1, b: vec![String::from("test"), String::from("value")] }
        }
    }

    // ---------
    // | Tests |
    // ---------

    /// Tests storing an item then retrieving it
    #[test]
    fn test_put_and_get() {
        // Add a value to the DB then read it back
        let db = mock_db();

        let key_name = "test_key".to_string();
        db.write(TABLE_NAME, &key_name, &TestValue::dummy()).unwrap();
        let val: Option<TestValue> = db.read(TABLE_NAME, &key_name).unwrap();

        assert_eq!(val.unwrap(), TestValue::dummy());
    }

    /// Tests retrieving a value that doesn't exist
    #[test]
    fn test_get_nonexistent() {
        let db = mock_db();

        let key_name = "test_key".to_string();
        let val: Option<TestValue> = db.read(TABLE_NAME, &key_name).unwrap();

        assert_eq!(val, None);
    }

    /// Tests deleting a key
    #[test]
    fn test_delete() {
        let db = mock_db();
        let key_name = "test_key".to_string();

        db.write(TABLE_NAME, &key_name, &TestValue::dummy()).unwrap();
        let exists = db.delete(TABLE_NAME, &key_name).unwrap();
        let val: Option<TestValue> = db.read(TABLE_NAME, &key_name).unwrap();

        assert!(exists);
        assert_eq!(val, None);
    }

    /// Tests a read-write tx writing multiple keys atomically
    #[test]
    fn test_rw_tx_simple() {
        let db = mock_db();

        // Write two keys to the table
        let key1 = "test_key".to_string();
        let key2 = "test_key2".to_string();
        let value1 = TestValue::dummy();
        let value2 = TestValue { a: 5, ..TestValue::dummy() };

        let tx = db.new_write_tx().unwrap();
        tx.write(TABLE_NAME, &key1, &value1).unwrap();
        tx.write(TABLE_NAME, &key2, &value2).unwrap();
        tx.commit().unwrap();

        // Read the values back
        let tx = db.new_read_tx().unwrap();
        let v1: Option<TestValue> = tx.read(TABLE_NAME, &key1).unwrap();
        let v2: Option<TestValue> = tx.read(TABLE_NAME, &key2).unwrap();
        tx.commit().unwrap();

        assert_eq!(v1.unwrap(), value1);
        assert_eq!(v2.unwrap(), value2);
    }

    /// Tests that an uncommitted tx leaves the table unchanged
    #[test]
    fn test_dropped_tx_discards_writes() {
        let db = mock_db();
        let key = "test_key".to_string();

        let tx = db.new_write_tx().unwrap();
        tx.write(TABLE_NAME, &key, &TestValue::dummy()).unwrap();
        drop(tx); // never committed

        let val: Option<TestValue> = db.read(TABLE_NAME, &key).unwrap();
        assert_eq!(val, None);
    }

    /// Tests recovering from a crash
    #[test]
    fn test_crash_recover() {
        let db = mock_db();

        // Set a key
        let key = "test_key".to_string();
        let value = TestValue { a: 10, ..TestValue::dummy() };
        db.write(TABLE_NAME, &key, &value).unwrap();

        // Drop the db to simulate a crash
        db.sync().unwrap();
        let path = db.path().to_string();
        drop(db);

        // Re-open the database at the same path and read the value
        let db = DB::new(&DbConfig { path }).unwrap();
        let val: Option<TestValue> = db.read(TABLE_NAME, &key).unwrap();

        assert_eq!(val.unwrap(), value);
    }
}
