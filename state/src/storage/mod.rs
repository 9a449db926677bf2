//! Defines the access patterns and interface to the durable storage layer,
//! concretely implemented as an `mdbx` instance

use std::borrow::Cow;

pub mod db;
pub mod error;
pub mod traits;
pub mod tx;

/// A type alias used for reading from the database
type CowBuffer<'a> = Cow<'a, [u8]>;
