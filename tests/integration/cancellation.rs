//! Cancellation is an abnormal completion like any other, distinguished only
//! by how the resulting error record is labelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pulse::error::Cancelled;
use pulse::transaction::record::{Outcome, TASK_CANCELLATION_CULPRIT};

use crate::integration::test_utils::{engine_with_sink, options, WorkError};

#[tokio::test]
async fn cancelled_work_keeps_its_measured_duration() {
    let (engine, sink) = engine_with_sink();
    let cancel_signal = Arc::new(AtomicBool::new(true));

    let result: Result<(), Cancelled> = engine
        .capture(options("cancellable", "background"), || {
            let cancel_signal = cancel_signal.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(25)).await;
                if cancel_signal.load(Ordering::SeqCst) {
                    return Err(Cancelled::new("shutdown requested"));
                }
                Ok(())
            }
        })
        .await;

    assert_eq!(result.unwrap_err(), Cancelled::new("shutdown requested"));
    let transactions = sink.transactions();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].outcome, Outcome::Failure);
    assert!(transactions[0].duration >= Duration::from_millis(25));
}

#[tokio::test]
async fn cancellation_culprit_is_distinct_from_generic_failures() {
    let (engine, sink) = engine_with_sink();

    let _ = engine
        .capture::<(), Cancelled, _, _>(options("cancelled", "background"), || async {
            Err(Cancelled::new("deadline passed"))
        })
        .await;
    let _ = engine
        .capture::<(), WorkError, _, _>(options("crashed", "background"), || async {
            Err(WorkError::new("segment missing"))
        })
        .await;

    let errors = sink.errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].culprit, TASK_CANCELLATION_CULPRIT);
    assert!(errors[0].is_cancellation());
    assert_ne!(errors[1].culprit, TASK_CANCELLATION_CULPRIT);
    assert!(!errors[1].is_cancellation());
}

#[tokio::test]
async fn cancellation_message_reaches_the_caller_verbatim() {
    let (engine, sink) = engine_with_sink();

    let result: Result<u8, Cancelled> = engine
        .capture(options("cancelled", "request"), || async {
            Err(Cancelled::new("client went away"))
        })
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.reason, "client went away");
    let exception = sink.errors()[0].exception.clone().unwrap();
    assert_eq!(exception.message, "task cancelled: client went away");
}
