//! Failing work across every capture shape: the original failure reaches the
//! caller unchanged, and exactly one transaction plus one linked error is
//! delivered.

use pulse::transaction::record::Outcome;

use crate::integration::test_utils::{engine_with_sink, options, WorkError};

fn assert_failure_captured(
    sink: &pulse::sink::MemorySink,
    expected_message: &str,
) {
    let transactions = sink.transactions();
    let errors = sink.errors();
    assert_eq!(transactions.len(), 1);
    assert_eq!(errors.len(), 1);
    assert_eq!(transactions[0].outcome, Outcome::Failure);
    assert_eq!(errors[0].parent_id, transactions[0].id);
    let exception = errors[0].exception.as_ref().expect("exception populated");
    assert!(exception.kind.ends_with("WorkError"));
    assert_eq!(exception.message, expected_message);
}

#[test]
fn blocking_unit_without_handle() {
    let (engine, sink) = engine_with_sink();
    let result: Result<(), WorkError> =
        engine.capture_blocking(options("fail", "job"), || Err(WorkError::new("unit broke")));
    assert_eq!(result.unwrap_err(), WorkError::new("unit broke"));
    assert_failure_captured(&sink, "unit broke");
}

#[test]
fn blocking_value_without_handle() {
    let (engine, sink) = engine_with_sink();
    let result: Result<u32, WorkError> =
        engine.capture_blocking(options("fail", "job"), || Err(WorkError::new("value broke")));
    assert_eq!(result.unwrap_err(), WorkError::new("value broke"));
    assert_failure_captured(&sink, "value broke");
}

#[test]
fn blocking_unit_with_handle() {
    let (engine, sink) = engine_with_sink();
    let result: Result<(), WorkError> =
        engine.capture_blocking_with(options("fail", "job"), |txn| {
            txn.set_label("phase", "write");
            Err(WorkError::new("handle unit broke"))
        });
    assert_eq!(result.unwrap_err(), WorkError::new("handle unit broke"));
    assert_failure_captured(&sink, "handle unit broke");
    assert!(sink.transactions()[0].context.label("phase").is_some());
}

#[test]
fn blocking_value_with_handle() {
    let (engine, sink) = engine_with_sink();
    let result: Result<String, WorkError> =
        engine.capture_blocking_with(options("fail", "job"), |_txn| {
            Err(WorkError::new("handle value broke"))
        });
    assert_eq!(result.unwrap_err(), WorkError::new("handle value broke"));
    assert_failure_captured(&sink, "handle value broke");
}

#[tokio::test]
async fn async_unit_without_handle() {
    let (engine, sink) = engine_with_sink();
    let result: Result<(), WorkError> = engine
        .capture(options("fail", "request"), || async {
            Err(WorkError::new("async unit broke"))
        })
        .await;
    assert_eq!(result.unwrap_err(), WorkError::new("async unit broke"));
    assert_failure_captured(&sink, "async unit broke");
}

#[tokio::test]
async fn async_value_without_handle() {
    let (engine, sink) = engine_with_sink();
    let result: Result<i64, WorkError> = engine
        .capture(options("fail", "request"), || async {
            Err(WorkError::new("async value broke"))
        })
        .await;
    assert_eq!(result.unwrap_err(), WorkError::new("async value broke"));
    assert_failure_captured(&sink, "async value broke");
}

#[tokio::test]
async fn async_unit_with_handle() {
    let (engine, sink) = engine_with_sink();
    let result: Result<(), WorkError> = engine
        .capture_with(options("fail", "request"), |txn| async move {
            txn.set_label("phase", "fetch");
            Err(WorkError::new("async handle unit broke"))
        })
        .await;
    assert_eq!(result.unwrap_err(), WorkError::new("async handle unit broke"));
    assert_failure_captured(&sink, "async handle unit broke");
}

#[tokio::test]
async fn async_value_with_handle() {
    let (engine, sink) = engine_with_sink();
    let result: Result<Vec<u8>, WorkError> = engine
        .capture_with(options("fail", "request"), |_txn| async {
            Err(WorkError::new("async handle value broke"))
        })
        .await;
    assert_eq!(result.unwrap_err(), WorkError::new("async handle value broke"));
    assert_failure_captured(&sink, "async handle value broke");
}

#[test]
fn failure_after_partial_work_still_measures_duration() {
    let (engine, sink) = engine_with_sink();
    let _ = engine.capture_blocking::<(), WorkError, _>(options("slow-fail", "job"), || {
        std::thread::sleep(std::time::Duration::from_millis(15));
        Err(WorkError::new("late failure"))
    });
    assert!(sink.transactions()[0].duration >= std::time::Duration::from_millis(15));
}
