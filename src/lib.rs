//! Wallet Ledger Library
//!
//! # Overview
//!
//! Seller wallet ledger and payout subsystem for a multi-tenant commerce
//! platform. Every balance change is an immutable, signed transaction; the
//! cached balance always equals the sum of the account's transaction log and
//! never goes negative, even under concurrent payout requests.
//!
//! # Architecture
//!
//! - [`types`] - accounts, transactions, payout requests, commands, errors
//! - [`core`] - business logic:
//!   - [`core::ledger`] - `WalletLedger`: `credit`, `request_debit`, `reconcile`, queries
//!   - [`core::store`] - per-account atomic units of work over an in-memory store
//!   - [`core::audit`] - audit records and sinks
//!   - [`core::retry`] - bounded retry on concurrency conflicts
//!   - [`core::batch_processor`] - account-partitioned concurrent replay
//! - [`io`] - CSV command input, summary and journal output
//! - [`strategy`] - sync and async replay pipelines
//! - [`cli`] - CLI argument parsing
//! - [`config`] / [`logging`] - tuning and `tracing` setup
//!
//! # Transaction Kinds
//!
//! - **SALE_CREDIT**: positive entry posted when an order is fulfilled and paid
//! - **PAYOUT_REQUEST**: negative entry reserving funds for a withdrawal
//! - **PAYOUT_REFUND**: positive entry returning the funds of a rejected payout
//! - **ADJUSTMENT**: manual positive correction
//!
//! # Payout Lifecycle
//!
//! `PENDING → APPROVED → PAID`, or `PENDING → REJECTED` with a refund.
//! PAID and REJECTED are terminal.
//!
//! # Example
//!
//! ```
//! use wallet_ledger::{LedgerConfig, PayoutMethod, TransactionKind, WalletLedger};
//!
//! let ledger = WalletLedger::new(&LedgerConfig::default());
//! ledger.open_account(1).unwrap();
//! ledger
//!     .credit(1, 10000, TransactionKind::SaleCredit, "order #A1B2C3", Some("A1B2C3"))
//!     .unwrap();
//!
//! let payout = ledger
//!     .request_debit(1, 4000, PayoutMethod::Momo, "0551234567")
//!     .unwrap();
//! assert_eq!(ledger.balance(1).unwrap(), 6000);
//!
//! ledger.reject(payout.id).unwrap();
//! assert_eq!(ledger.balance(1).unwrap(), 10000);
//! assert!(ledger.reconcile(1).unwrap());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use config::LedgerConfig;
pub use core::{
    AuditAction, AuditRecord, AuditSink, LedgerStore, MemoryAuditSink, MemoryLedgerStore,
    TracingAuditSink, WalletLedger,
};
pub use io::{write_accounts_csv, write_journal_csv};
pub use types::{
    Account, AccountId, AccountSummary, Amount, LedgerCommand, LedgerError, Page, PageRequest,
    PayoutAction, PayoutId, PayoutMethod, PayoutRequest, PayoutStatus, Reconciliation,
    Transaction, TransactionId, TransactionKind,
};
