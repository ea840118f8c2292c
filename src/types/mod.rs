//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: accounts, summaries and reconciliation results
//! - `transaction`: ledger entries and their kinds
//! - `payout`: payout requests and the payout state machine rules
//! - `command`: commands replayed from input files
//! - `money`: minor-unit amounts and their decimal representation
//! - `page`: pagination for the query surface
//! - `error`: error types for the ledger

pub mod account;
pub mod command;
pub mod error;
pub mod money;
pub mod page;
pub mod payout;
pub mod transaction;

pub use account::{Account, AccountId, AccountSummary, Reconciliation};
pub use command::LedgerCommand;
pub use error::LedgerError;
pub use money::{format_minor_units, parse_major_units, Amount};
pub use page::{Page, PageRequest};
pub use payout::{PayoutAction, PayoutId, PayoutMethod, PayoutRequest, PayoutStatus};
pub use transaction::{Transaction, TransactionId, TransactionKind};
