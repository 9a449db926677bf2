//! Defines the transaction interface to the database: a key-value view over
//! a single `mdbx` transaction, with serialization handled at the boundary

use libmdbx::{RW, Table, TableFlags, Transaction, TransactionKind, WriteFlags, WriteMap};

use super::{
    CowBuffer,
    db::{deserialize_value, serialize_value},
    error::StorageError,
    traits::{Key, Value},
};

/// A transaction in the database
///
/// MDBX guarantees isolation between transactions
pub struct DbTxn<'db, T: TransactionKind> {
    /// The underlying `mdbx` transaction
    txn: Transaction<'db, T, WriteMap>,
}

impl<'db, T: TransactionKind> DbTxn<'db, T> {
    /// Constructor
    pub fn new(txn: Transaction<'db, T, WriteMap>) -> Self {
        Self { txn }
    }

    /// Get a key from the database
    pub fn read<K: Key, V: Value>(
        &self,
        table_name: &str,
        key: &K,
    ) -> Result<Option<V>, StorageError> {
        // Read bytes then deserialize as a `serde::Deserialize`
        let value_bytes = self.read_bytes(table_name, key)?;
        value_bytes.map(|bytes| deserialize_value(&bytes)).transpose()
    }

    /// Read all values in a table, in key order
    pub fn read_all<V: Value>(&self, table_name: &str) -> Result<Vec<V>, StorageError> {
        let table = self.open_table(table_name)?;
        let mut cursor = self.txn.cursor(&table).map_err(StorageError::TxOp)?;

        let mut values = Vec::new();
        let mut entry =
            cursor.first::<CowBuffer, CowBuffer>().map_err(StorageError::TxOp)?;
        while let Some((_key, value_bytes)) = entry {
            values.push(deserialize_value(&value_bytes)?);
            entry = cursor.next::<CowBuffer, CowBuffer>().map_err(StorageError::TxOp)?;
        }

        Ok(values)
    }

    /// Count the entries in a table
    pub fn count(&self, table_name: &str) -> Result<u64, StorageError> {
        let table = self.open_table(table_name)?;
        let mut cursor = self.txn.cursor(&table).map_err(StorageError::TxOp)?;

        let mut count = 0;
        let mut entry =
            cursor.first::<CowBuffer, CowBuffer>().map_err(StorageError::TxOp)?;
        while entry.is_some() {
            count += 1;
            entry = cursor.next::<CowBuffer, CowBuffer>().map_err(StorageError::TxOp)?;
        }

        Ok(count)
    }

    /// Commit the transaction
    pub fn commit(self) -> Result<(), StorageError> {
        self.txn.commit().map_err(StorageError::Commit).map(|_| ())
    }

    // -----------
    // | Helpers |
    // -----------

    /// Read a byte array directly from the database
    fn read_bytes<K: Key>(
        &self,
        table_name: &str,
        key: &K,
    ) -> Result<Option<CowBuffer>, StorageError> {
        // Serialize the key
        let key_bytes = serialize_value(key)?;

        // Get the value
        let table = self.open_table(table_name)?;
        self.txn.get(&table, &key_bytes).map_err(StorageError::TxOp)
    }

    /// Open a table if the transaction has not done so already
    fn open_table(&self, table_name: &str) -> Result<Table, StorageError> {
        self.txn.open_table(Some(table_name)).map_err(StorageError::OpenTable)
    }
}

// Write-enabled implementation
impl<'db> DbTxn<'db, RW> {
    /// Create a new table in the database
    pub fn create_table(&self, table_name: &str) -> Result<(), StorageError> {
        self.txn
            .create_table(Some(table_name), TableFlags::default())
            .map_err(StorageError::TxOp)
            .map(|_| ())
    }

    /// Set a key in the database
    pub fn write<K: Key, V: Value>(
        &self,
        table_name: &str,
        key: &K,
        value: &V,
    ) -> Result<(), StorageError> {
        let value_bytes = serialize_value(value)?;
        self.write_bytes(table_name, key, &value_bytes)
    }

    /// Remove a key from the database
    ///
    /// Returns `true` if the key was present in the table
    pub fn delete<K: Key>(&self, table_name: &str, key: &K) -> Result<bool, StorageError> {
        // Serialize the key
        let key_bytes = serialize_value(key)?;

        // Delete the value
        let table = self.open_table(table_name)?;
        self.txn.del(&table, key_bytes, None /* data */).map_err(StorageError::TxOp)
    }

    // -----------
    // | Helpers |
    // -----------

    /// Write a byte array directly to the database
    fn write_bytes<K: Key>(
        &self,
        table_name: &str,
        key: &K,
        value_bytes: &[u8],
    ) -> Result<(), StorageError> {
        // Serialize the key
        let key_bytes = serialize_value(key)?;

        // Set the value
        let table = self.open_table(table_name)?;
        self.txn
            .put(&table, key_bytes, value_bytes, WriteFlags::default())
            .map_err(StorageError::TxOp)
    }
}
