//! Finished records handed to the delivery sink.

use std::any::Any;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::TransactionContext;
use crate::error::Cancelled;
use crate::types::{ErrorId, TraceToken, TransactionId};

/// Culprit assigned to errors synthesized from a task-cancellation failure.
pub const TASK_CANCELLATION_CULPRIT: &str = "task cancellation";

/// Success/failure classification assigned when a transaction ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// Immutable snapshot of a finished transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_token: Option<TraceToken>,
    /// Wall-clock start timestamp, RFC 3339 with millisecond precision.
    pub started_at: String,
    /// Monotonic-clock duration fixed at termination.
    pub duration: Duration,
    pub outcome: Outcome,
    pub context: TransactionContext,
}

/// The failure that produced an error record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exception {
    /// Fully-qualified name of the failure type.
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// An explicitly recorded structured log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLog {
    pub message: String,
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_message: Option<String>,
}

/// A captured failure or log event, linked to its owning transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: ErrorId,
    pub parent_id: TransactionId,
    /// Short human-readable description of what failed.
    pub culprit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<Exception>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<ErrorLog>,
}

impl ErrorRecord {
    /// Synthesize an error record from a failure propagated out of wrapped
    /// work. The original failure value is left untouched; only its type name
    /// and display message are captured.
    pub fn from_failure<E>(parent_id: TransactionId, error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        let kind = std::any::type_name::<E>().to_string();
        let culprit = if (error as &dyn Any).downcast_ref::<Cancelled>().is_some() {
            TASK_CANCELLATION_CULPRIT.to_string()
        } else {
            short_type_name(&kind).to_string()
        };
        Self {
            id: ErrorId::generate(),
            parent_id,
            culprit,
            exception: Some(Exception {
                kind,
                message: error.to_string(),
            }),
            log: None,
        }
    }

    /// Build an error record from an explicitly attached log entry.
    pub fn from_log(
        parent_id: TransactionId,
        level: impl Into<String>,
        message: impl Into<String>,
        param_message: Option<String>,
    ) -> Self {
        let message = message.into();
        Self {
            id: ErrorId::generate(),
            parent_id,
            culprit: "recorded log entry".to_string(),
            exception: None,
            log: Some(ErrorLog {
                message,
                level: level.into(),
                param_message,
            }),
        }
    }

    pub fn is_cancellation(&self) -> bool {
        self.culprit == TASK_CANCELLATION_CULPRIT
    }
}

/// Last path segment of a type name, generics stripped.
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
