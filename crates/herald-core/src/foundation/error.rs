//! Shared error types for the Herald core.
//!
//! Dispatch-level errors live in `herald-framework`; this module only holds
//! what the platform model itself can fail with, plus the boxed error aliases
//! used for user-supplied handlers, checks and converters.

use std::error::Error;
use std::sync::Arc;

use thiserror::Error;

/// An owned, type-erased error returned by user code.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// A cheaply clonable, type-erased error.
///
/// Errors reported through the error channel are fanned out to several
/// subscribers, so the original error is kept behind an `Arc`.
pub type SharedError = Arc<dyn Error + Send + Sync>;

/// Errors that can occur while decoding platform events.
#[derive(Debug, Clone, Error)]
pub enum EventError {
    /// The raw payload could not be decoded.
    #[error("failed to parse event: {reason}")]
    Parse {
        /// Reason for failure.
        reason: String,
    },
}

impl EventError {
    /// Creates a parse error.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}

/// Result type for event decoding.
pub type EventResult<T> = Result<T, EventError>;
