//! Defines and implements the worker that ingests the Bennee contract's
//! event logs into the record store
//!
//! The pipeline drives a decode-build-persist flow over contiguous block
//! ranges: every block's records commit in one atomic unit together with the
//! ingestion cursor, blocks commit in strictly ascending order, and
//! re-running a committed range is a safe no-op per record

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod error;
pub mod executor;
pub mod worker;

pub use executor::{IngestionExecutor, IngestionReport, SkippedLog};
pub use worker::{IngestionWorker, IngestionWorkerConfig};
