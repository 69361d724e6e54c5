//! Capture engine: entry points that wrap user work in a lifecycle-managed
//! transaction.
//!
//! Four entry points cover the eight behavioral shapes (blocking vs. async,
//! handle-exposing vs. not, unit vs. value result — the result axis is the
//! generic return type). All of them funnel into one shared finish routine:
//! end the transaction, snapshot it, enqueue it, synthesize and enqueue an
//! error on failure, and hand the work's own result back to the caller
//! untouched. The engine never retries, wraps, or suppresses anything the
//! wrapped work does.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::correlation;
use crate::error::CaptureError;
use crate::sink::DeliverySink;
use crate::transaction::record::{ErrorRecord, Outcome};
use crate::transaction::Transaction;
use crate::types::TraceToken;

/// Validated inputs for one capture.
///
/// Construction is the call boundary where caller programming errors are
/// reported: an empty name or type never creates a transaction.
#[derive(Debug, Clone)]
pub struct TransactionOptions {
    name: String,
    kind: String,
    trace_token: Option<TraceToken>,
}

impl TransactionOptions {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Result<Self, CaptureError> {
        let name = name.into();
        let kind = kind.into();
        if name.trim().is_empty() {
            return Err(CaptureError::EmptyName);
        }
        if kind.trim().is_empty() {
            return Err(CaptureError::EmptyKind);
        }
        Ok(Self {
            name,
            kind,
            trace_token: None,
        })
    }

    /// Attach a distributed-trace continuation token.
    pub fn trace_token(mut self, token: TraceToken) -> Self {
        self.trace_token = Some(token);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }
}

/// The capture engine. Cheap to clone; all clones share the same sink.
#[derive(Clone)]
pub struct CaptureEngine {
    sink: Arc<dyn DeliverySink>,
}

impl CaptureEngine {
    pub fn new(sink: Arc<dyn DeliverySink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &Arc<dyn DeliverySink> {
        &self.sink
    }

    /// Wrap blocking work that does not need the transaction handle.
    pub fn capture_blocking<R, E, F>(&self, options: TransactionOptions, work: F) -> Result<R, E>
    where
        E: std::error::Error + 'static,
        F: FnOnce() -> Result<R, E>,
    {
        self.capture_blocking_with(options, |_| work())
    }

    /// Wrap blocking work, handing it the transaction handle for annotation.
    pub fn capture_blocking_with<R, E, F>(
        &self,
        options: TransactionOptions,
        work: F,
    ) -> Result<R, E>
    where
        E: std::error::Error + 'static,
        F: FnOnce(&Transaction) -> Result<R, E>,
    {
        let txn = self.begin(options);
        let result = {
            let _scope = correlation::enter(txn.clone());
            work(&txn)
        };
        self.finish(&txn, &result);
        result
    }

    /// Wrap async work that does not need the transaction handle.
    pub async fn capture<R, E, F, Fut>(&self, options: TransactionOptions, work: F) -> Result<R, E>
    where
        E: std::error::Error + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        self.capture_with(options, move |_| work()).await
    }

    /// Wrap async work, handing it the transaction handle for annotation.
    ///
    /// The transaction is ambient for the whole wrapped future, across its
    /// internal await points; the engine adds no suspension of its own.
    pub async fn capture_with<R, E, F, Fut>(
        &self,
        options: TransactionOptions,
        work: F,
    ) -> Result<R, E>
    where
        E: std::error::Error + 'static,
        F: FnOnce(Transaction) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let txn = self.begin(options);
        let result = correlation::scope(txn.clone(), work(txn.clone())).await;
        self.finish(&txn, &result);
        result
    }

    fn begin(&self, options: TransactionOptions) -> Transaction {
        Transaction::start(options.name, options.kind, options.trace_token)
    }

    /// Shared termination bookkeeping for every entry point: end (idempotent
    /// against an explicit in-callback end), snapshot at delivery time,
    /// enqueue the transaction strictly before any error linked to it.
    fn finish<R, E>(&self, txn: &Transaction, result: &Result<R, E>)
    where
        E: std::error::Error + 'static,
    {
        let outcome = match result {
            Ok(_) => Outcome::Success,
            Err(_) => Outcome::Failure,
        };
        txn.end_with_outcome(outcome);
        let record = txn.snapshot();
        debug!(
            id = %record.id,
            name = %record.name,
            outcome = record.outcome.as_str(),
            "transaction delivered"
        );
        let parent_id = record.id.clone();
        self.sink.enqueue_transaction(record);
        if let Err(error) = result {
            self.sink.enqueue_error(ErrorRecord::from_failure(parent_id, error));
        }
        for pending in txn.take_pending_errors() {
            self.sink.enqueue_error(pending);
        }
    }
}
