//! Pulse: Transaction Capture Core
//!
//! The transaction-capture core of an APM agent: wraps units of work in timed
//! transactions, propagates an ambient "current transaction" through blocking
//! and async flows, captures context, labels, and errors attached along the
//! way, and hands the finished records to a delivery sink. The wrapped work's
//! own result — value or failure — always reaches the caller untouched.

pub mod capture;
pub mod context;
pub mod correlation;
pub mod error;
pub mod logging;
pub mod sink;
pub mod transaction;
pub mod types;
