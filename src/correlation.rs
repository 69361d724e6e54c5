//! Correlation propagator: the ambient "current transaction" reference.
//!
//! The ambient reference is flow-local, never a process-wide singleton.
//! Blocking flows use a thread-local scope stack with an RAII guard; async
//! flows use a tokio task-local slot installed around the wrapped future, so
//! continuations after await points observe the transaction while sibling
//! tasks do not. Lookup checks the task-local slot first, then the
//! thread-local stack.

use std::cell::RefCell;
use std::future::Future;

use crate::transaction::Transaction;

tokio::task_local! {
    static TASK_CURRENT: Transaction;
}

thread_local! {
    static THREAD_SCOPES: RefCell<Vec<Transaction>> = RefCell::new(Vec::new());
}

/// The transaction ambient in the current logical flow, if any.
pub fn current() -> Option<Transaction> {
    if let Ok(txn) = TASK_CURRENT.try_with(Transaction::clone) {
        return Some(txn);
    }
    THREAD_SCOPES.with(|scopes| scopes.borrow().last().cloned())
}

/// Guard for a blocking-flow scope. Dropping it pops the scope, restoring
/// whatever transaction was ambient before.
#[must_use = "the scope ends when the guard is dropped"]
pub struct ScopeGuard {
    _private: (),
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        THREAD_SCOPES.with(|scopes| {
            scopes.borrow_mut().pop();
        });
    }
}

/// Install `txn` as the ambient transaction for the current thread until the
/// returned guard is dropped.
pub fn enter(txn: Transaction) -> ScopeGuard {
    THREAD_SCOPES.with(|scopes| scopes.borrow_mut().push(txn));
    ScopeGuard { _private: () }
}

/// Run `fut` with `txn` as the ambient transaction for that future's whole
/// logical flow, including continuations after its internal await points.
pub async fn scope<F>(txn: Transaction, fut: F) -> F::Output
where
    F: Future,
{
    TASK_CURRENT.scope(txn, fut).await
}
