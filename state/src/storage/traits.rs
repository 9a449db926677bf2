//! Trait definitions for the types stored in the database

use serde::{Deserialize, Serialize};

/// A type that may be used as a key in the database
pub trait Key: Serialize {}
impl<T: Serialize> Key for T {}

/// A type that may be stored as a value in the database
pub trait Value: Serialize + for<'de> Deserialize<'de> + Clone {}
impl<T: Serialize + for<'de> Deserialize<'de> + Clone> Value for T {}
