//! Defines one-off utility functions used throughout the indexer

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod errors;
pub mod hex;
pub mod logging;
