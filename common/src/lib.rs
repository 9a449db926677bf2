//! Defines common types and abstractions that many crates in the indexer
//! depend on

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod types;
pub mod worker;
