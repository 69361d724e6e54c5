//! Transaction lifecycle: creation, timing, mutation, and termination.
//!
//! A [`Transaction`] is a cheaply cloneable handle over shared state. It is
//! created in the `Started` state with the monotonic clock already sampled;
//! `Ended` is terminal and entered exactly once. Ending fixes the duration and
//! outcome; context annotation stays open until the engine snapshots the
//! finished record for delivery.

pub mod record;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use tracing::debug;

use crate::context::{LabelValue, Request, Response, TransactionContext, User};
use crate::transaction::record::{ErrorRecord, Outcome, TransactionRecord};
use crate::types::{TraceToken, TransactionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Started,
    Ended,
}

struct Inner {
    id: TransactionId,
    name: String,
    kind: String,
    trace_token: Option<TraceToken>,
    started_at: String,
    started: Instant,
    state: State,
    duration: Option<Duration>,
    outcome: Option<Outcome>,
    context: TransactionContext,
    pending_errors: Vec<ErrorRecord>,
}

/// Handle to an in-flight transaction.
///
/// Clones share the same underlying state. Mutation is expected only from the
/// single logical flow that owns the handle; the lock exists so the capture
/// engine and the callback can safely share the handle, not to support
/// concurrent writers.
#[derive(Clone)]
pub struct Transaction {
    inner: Arc<Mutex<Inner>>,
}

impl Transaction {
    pub(crate) fn start(name: String, kind: String, trace_token: Option<TraceToken>) -> Self {
        let id = TransactionId::generate();
        debug!(id = %id, name = %name, kind = %kind, "transaction started");
        Self {
            inner: Arc::new(Mutex::new(Inner {
                id,
                name,
                kind,
                trace_token,
                started_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                started: Instant::now(),
                state: State::Started,
                duration: None,
                outcome: None,
                context: TransactionContext::default(),
                pending_errors: Vec::new(),
            })),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.inner.lock().id.clone()
    }

    pub fn name(&self) -> String {
        self.inner.lock().name.clone()
    }

    pub fn kind(&self) -> String {
        self.inner.lock().kind.clone()
    }

    pub fn trace_token(&self) -> Option<TraceToken> {
        self.inner.lock().trace_token.clone()
    }

    pub fn set_trace_token(&self, token: TraceToken) {
        self.inner.lock().trace_token = Some(token);
    }

    pub fn is_ended(&self) -> bool {
        self.inner.lock().state == State::Ended
    }

    /// Outcome assigned at termination, if the transaction has ended.
    pub fn outcome(&self) -> Option<Outcome> {
        self.inner.lock().outcome
    }

    /// Duration fixed at termination, if the transaction has ended.
    pub fn duration(&self) -> Option<Duration> {
        self.inner.lock().duration
    }

    pub fn set_label(&self, key: impl Into<String>, value: impl Into<LabelValue>) {
        self.inner.lock().context.set_label(key, value);
    }

    pub fn set_custom(&self, key: impl Into<String>, value: serde_json::Value) {
        self.inner.lock().context.set_custom(key, value);
    }

    pub fn set_request(&self, request: Request) {
        self.inner.lock().context.request = Some(request);
    }

    pub fn set_response(&self, response: Response) {
        self.inner.lock().context.response = Some(response);
    }

    pub fn set_user(&self, user: User) {
        self.inner.lock().context.user = Some(user);
    }

    /// Attach a structured log entry to this transaction.
    ///
    /// The entry becomes an [`ErrorRecord`] with `log` populated and no
    /// exception, delivered after the transaction record itself.
    pub fn record_log(
        &self,
        level: impl Into<String>,
        message: impl Into<String>,
        param_message: Option<String>,
    ) {
        let mut inner = self.inner.lock();
        let entry = ErrorRecord::from_log(inner.id.clone(), level, message, param_message);
        inner.pending_errors.push(entry);
    }

    /// Attach a failure observed and handled inside the callback.
    ///
    /// Unlike a failure propagated out of the wrapped work, a recorded error
    /// does not change the transaction's outcome.
    pub fn record_error<E>(&self, error: &E)
    where
        E: std::error::Error + 'static,
    {
        let mut inner = self.inner.lock();
        let entry = ErrorRecord::from_failure(inner.id.clone(), error);
        inner.pending_errors.push(entry);
    }

    /// End this transaction with a success outcome.
    ///
    /// Ending is idempotent: the first call (explicit or the engine's
    /// automatic end-on-return) fixes the duration and outcome, and any later
    /// attempt is a silent no-op.
    pub fn end(&self) {
        self.end_with_outcome(Outcome::Success);
    }

    pub(crate) fn end_with_outcome(&self, outcome: Outcome) {
        let mut inner = self.inner.lock();
        if inner.state == State::Ended {
            debug!(id = %inner.id, "transaction already ended; ignoring repeated end");
            return;
        }
        inner.state = State::Ended;
        inner.duration = Some(inner.started.elapsed());
        inner.outcome = Some(outcome);
        debug!(
            id = %inner.id,
            name = %inner.name,
            outcome = outcome.as_str(),
            duration_us = inner.duration.map(|d| d.as_micros()).unwrap_or(0),
            "transaction ended"
        );
    }

    /// Snapshot the finished record for delivery. Context is captured here,
    /// at delivery time, so annotations made after an explicit in-callback
    /// end are still included.
    pub(crate) fn snapshot(&self) -> TransactionRecord {
        let inner = self.inner.lock();
        TransactionRecord {
            id: inner.id.clone(),
            name: inner.name.clone(),
            kind: inner.kind.clone(),
            trace_token: inner.trace_token.clone(),
            started_at: inner.started_at.clone(),
            duration: inner.duration.unwrap_or_else(|| inner.started.elapsed()),
            outcome: inner.outcome.unwrap_or(Outcome::Success),
            context: inner.context.clone(),
        }
    }

    pub(crate) fn take_pending_errors(&self) -> Vec<ErrorRecord> {
        std::mem::take(&mut self.inner.lock().pending_errors)
    }
}
