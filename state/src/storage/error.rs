//! Error types for storage access

use libmdbx::Error as MdbxError;

/// The error type emitted by the storage layer
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Error creating a new transaction in the database
    #[error("error beginning a transaction: {0}")]
    BeginTx(MdbxError),
    /// Error committing a transaction
    #[error("error committing a transaction: {0}")]
    Commit(MdbxError),
    /// A record upsert attempted to overwrite an existing record with
    /// different contents
    #[error("conflicting write for existing record: {0}")]
    ConflictingRecord(String),
    /// Error deserializing a value from storage
    #[error("error deserializing a stored value: {0}")]
    Deserialization(String),
    /// Failure opening the database
    #[error("error opening the database: {0}")]
    OpenDb(MdbxError),
    /// Failure opening a table in the database
    #[error("error opening a table: {0}")]
    OpenTable(MdbxError),
    /// Error serializing a value for storage
    #[error("error serializing a value for storage: {0}")]
    Serialization(String),
    /// Error syncing the database
    #[error("error syncing the database: {0}")]
    Sync(MdbxError),
    /// Error while performing a transaction operation
    #[error("error in a transaction operation: {0}")]
    TxOp(MdbxError),
}
