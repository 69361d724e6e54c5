//! Shared helpers for capture integration tests.

use std::fmt;
use std::sync::Arc;

use pulse::capture::{CaptureEngine, TransactionOptions};
use pulse::sink::MemorySink;

/// Failure type standing in for arbitrary user errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkError(pub String);

impl WorkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for WorkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for WorkError {}

pub fn engine_with_sink() -> (CaptureEngine, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (CaptureEngine::new(sink.clone()), sink)
}

pub fn options(name: &str, kind: &str) -> TransactionOptions {
    TransactionOptions::new(name, kind).expect("test options are non-empty")
}
