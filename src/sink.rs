//! Delivery sink interface and in-process implementations.
//!
//! The capture engine only ever hands finished records to a [`DeliverySink`];
//! serialization, transport, and retry belong to the delivery subsystem
//! behind it. [`MemorySink`] and [`ChannelSink`] are the in-process
//! implementations used by tests and by graceful-shutdown draining.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::warn;

use crate::transaction::record::{ErrorRecord, TransactionRecord};

/// Receives finished records. Enqueueing is fire-and-forget: the engine never
/// blocks on, retries, or observes delivery.
pub trait DeliverySink: Send + Sync {
    fn enqueue_transaction(&self, record: TransactionRecord);
    fn enqueue_error(&self, record: ErrorRecord);
}

/// One delivered item, in enqueue order.
#[derive(Debug, Clone)]
pub enum DeliveryItem {
    Transaction(TransactionRecord),
    Error(ErrorRecord),
}

#[derive(Default)]
struct MemoryState {
    transactions: Vec<TransactionRecord>,
    errors: Vec<ErrorRecord>,
}

/// Sink that collects records in memory and lets an observer block until
/// enough of them have been flushed.
#[derive(Default)]
pub struct MemorySink {
    state: Mutex<MemoryState>,
    flushed: Condvar,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.state.lock().transactions.clone()
    }

    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.state.lock().errors.clone()
    }

    /// Block until at least `count` transactions have been enqueued. Returns
    /// whether the threshold was reached before the timeout.
    pub fn wait_for_transactions(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.transactions.len() < count {
            if self.flushed.wait_until(&mut state, deadline).timed_out() {
                return state.transactions.len() >= count;
            }
        }
        true
    }

    /// Block until at least `count` errors have been enqueued.
    pub fn wait_for_errors(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.errors.len() < count {
            if self.flushed.wait_until(&mut state, deadline).timed_out() {
                return state.errors.len() >= count;
            }
        }
        true
    }
}

impl DeliverySink for MemorySink {
    fn enqueue_transaction(&self, record: TransactionRecord) {
        self.state.lock().transactions.push(record);
        self.flushed.notify_all();
    }

    fn enqueue_error(&self, record: ErrorRecord) {
        self.state.lock().errors.push(record);
        self.flushed.notify_all();
    }
}

/// Sink that streams records over an in-process channel, preserving enqueue
/// order so a consumer can verify parent-before-child delivery.
#[derive(Clone)]
pub struct ChannelSink {
    sender: Sender<DeliveryItem>,
}

impl ChannelSink {
    pub fn new_pair() -> (Self, Receiver<DeliveryItem>) {
        let (sender, receiver) = channel();
        (Self { sender }, receiver)
    }
}

impl DeliverySink for ChannelSink {
    fn enqueue_transaction(&self, record: TransactionRecord) {
        if self.sender.send(DeliveryItem::Transaction(record)).is_err() {
            warn!("delivery channel closed; discarding transaction record");
        }
    }

    fn enqueue_error(&self, record: ErrorRecord) {
        if self.sender.send(DeliveryItem::Error(record)).is_err() {
            warn!("delivery channel closed; discarding error record");
        }
    }
}
