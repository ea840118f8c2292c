//! Core ledger logic
//!
//! - `traits` - storage and audit seams
//! - `store` - in-memory store and the per-account unit of work
//! - `ledger` - `WalletLedger`: credits, payout requests, reconciliation, queries
//! - `payout` - payout request state machine
//! - `audit` - audit records and sinks
//! - `retry` - bounded retry on concurrency conflicts
//! - `command_handler` - dispatch of parsed commands
//! - `batch_processor` - account-partitioned concurrent replay

pub mod audit;
pub mod batch_processor;
mod command_handler;
pub mod ledger;
mod payout;
pub mod retry;
pub mod store;
pub mod traits;

pub use audit::{AuditAction, AuditError, AuditRecord, MemoryAuditSink, TracingAuditSink};
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use ledger::WalletLedger;
pub use retry::RetryPolicy;
pub use store::{AccountBook, AccountUnit, MemoryLedgerStore};
pub use traits::{AuditSink, LedgerStore};
