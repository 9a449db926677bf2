//! Possible errors thrown by the Bennee client and its event decoder

use std::fmt::Display;

use alloy_primitives::B256;
use common::types::BlockNumber;

/// The error type returned by a log source
#[derive(Clone, Debug, thiserror::Error)]
pub enum LogSourceError {
    /// Error thrown when the requested block does not yet exist at the source
    ///
    /// Callers should stop their run and retry later rather than failing
    #[error("block {0} not found at the log source")]
    BlockNotFound(BlockNumber),
    /// Error thrown on a transient source failure; retryable
    #[error("log source unavailable: {0}")]
    SourceUnavailable(String),
}

impl LogSourceError {
    /// Create a new source unavailable error
    #[allow(clippy::needless_pass_by_value)]
    pub fn source_unavailable<T: ToString>(msg: T) -> Self {
        Self::SourceUnavailable(msg.to_string())
    }

    /// Whether the error is transient and the same call may be retried
    pub fn is_transient(&self) -> bool {
        matches!(self, LogSourceError::SourceUnavailable(_))
    }
}

impl<E: Display> From<alloy::transports::RpcError<E>> for LogSourceError {
    fn from(e: alloy::transports::RpcError<E>) -> Self {
        LogSourceError::source_unavailable(e)
    }
}

/// The error type returned when decoding a raw log into a typed event
#[derive(Clone, Debug, thiserror::Error)]
pub enum EventDecodingError {
    /// Error thrown when a log's signature topic matches no tracked event
    /// kind; the log belongs to an event the indexer does not follow
    #[error("unknown event signature {0}")]
    UnknownSignature(B256),
    /// Error thrown when a log carries a different parameter count than the
    /// matched event kind declares
    #[error("{event} declares {expected} parameters, log carries {actual}")]
    ArityMismatch {
        /// The name of the matched event kind
        event: &'static str,
        /// The declared parameter count
        expected: usize,
        /// The parameter count the log carries
        actual: usize,
    },
    /// Error thrown when a parameter value cannot be coerced to the type the
    /// matched event kind declares for its position
    #[error("{event} parameter `{param}` declares {expected}, log carries {actual}")]
    TypeMismatch {
        /// The name of the matched event kind
        event: &'static str,
        /// The name of the offending parameter
        param: &'static str,
        /// The declared parameter type
        expected: &'static str,
        /// The type the log carries at that position
        actual: &'static str,
    },
}

impl EventDecodingError {
    /// Whether the error indicates a malformed log for a tracked event kind,
    /// as opposed to an event kind the indexer does not follow
    pub fn is_malformed(&self) -> bool {
        !matches!(self, EventDecodingError::UnknownSignature(_))
    }
}
