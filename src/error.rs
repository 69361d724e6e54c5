//! Error types for the transaction capture core.

use thiserror::Error;

/// Caller programming errors reported at the capture boundary.
///
/// None of these ever originate from the wrapped work: a failing callback is
/// the designed pass-through path, not a capture error.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("transaction name must not be empty")]
    EmptyName,

    #[error("transaction type must not be empty")]
    EmptyKind,

    #[error("invalid logging configuration: {0}")]
    Logging(String),
}

/// Failure kind marking a task-cancellation termination.
///
/// Wrapped work that observes a cancellation signal returns this instead of an
/// ordinary error; the engine captures it through the same path but labels the
/// resulting error record as a cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task cancelled: {reason}")]
pub struct Cancelled {
    pub reason: String,
}

impl Cancelled {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
