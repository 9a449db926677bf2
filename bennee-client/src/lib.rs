//! Defines the client interface to the Bennee lending contract's event
//! stream: the contract's event ABI, the decoder from raw logs to typed
//! events, and the log source abstraction the ingestion pipeline consumes

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod abi;
pub mod client;
pub mod decode;
pub mod errors;
#[cfg(any(test, feature = "mocks"))]
pub mod mock;
pub mod traits;

pub use client::BenneeClient;
pub use decode::decode_event;
pub use traits::LogSource;
