//! Error types for the wallet ledger
//!
//! Every ledger outcome is an explicit `Result`; callers handle insufficient
//! funds and invalid transitions as ordinary control flow.
//!
//! # Error Categories
//!
//! - **Validation**: invalid amount, invalid kind, duplicate reference
//! - **Lookup**: account or payout not found, account already exists
//! - **Business rules**: insufficient funds, invalid state transition
//! - **Contention**: concurrency conflict (the only retryable error)
//! - **Integrity**: arithmetic overflow, invariant violation, storage failure
//! - **Boundary I/O**: file and CSV errors of the replay tool

use thiserror::Error;

use super::account::AccountId;
use super::money::Amount;
use super::payout::{PayoutAction, PayoutId, PayoutStatus};
use super::transaction::TransactionKind;

/// Main error type for the ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Amount is zero, negative, or not a valid money value
    ///
    /// Rejected before any mutation.
    #[error("Invalid amount '{amount}'")]
    InvalidAmount { amount: String },

    /// The debit would drive the balance negative
    ///
    /// No mutation occurs; the caller may retry with a smaller amount.
    #[error("Insufficient funds for account {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        available: Amount,
        requested: Amount,
    },

    /// Referenced account does not exist
    #[error("Account {account} not found")]
    AccountNotFound { account: AccountId },

    /// An account with this id is already registered
    #[error("Account {account} already exists")]
    AccountAlreadyExists { account: AccountId },

    /// Referenced payout request does not exist
    #[error("Payout request {payout} not found")]
    PayoutNotFound { payout: String },

    /// The payout state machine does not permit this transition
    ///
    /// Typically an admin-UI double click. No mutation occurs.
    #[error("Cannot {action} payout request {payout} in state {from}")]
    InvalidStateTransition {
        payout: PayoutId,
        from: PayoutStatus,
        action: PayoutAction,
    },

    /// Kind cannot be posted through `credit`
    #[error("Transaction kind {kind} cannot be credited by callers")]
    InvalidKind { kind: TransactionKind },

    /// Reference or idempotency key reused with different parameters
    #[error("Reference '{reference}' on account {account} was already used for a different request")]
    DuplicateReference { account: AccountId, reference: String },

    /// The atomic unit could not take the account lock in time
    ///
    /// The only retryable error: re-run the whole operation from scratch.
    #[error("Concurrency conflict on account {account}, try again")]
    ConcurrencyConflict { account: AccountId },

    /// Balance arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow { operation: String, account: AccountId },

    /// A unit of work would have committed a negative balance
    #[error("Unit of work on account {account} would leave balance {balance}")]
    InvariantViolation { account: AccountId, balance: i128 },

    /// The storage engine failed; nothing was written
    #[error("Storage failure: {message}")]
    Storage { message: String },

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// I/O error while reading or writing files
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// CSV parsing error
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError { line: Option<u64>, message: String },

    /// A CSV row that does not form a valid command
    #[error("Invalid command '{command}': {reason}")]
    InvalidCommand { command: String, reason: String },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl LedgerError {
    /// Whether re-running the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::ConcurrencyConflict { .. })
    }

    pub fn invalid_amount(amount: impl ToString) -> Self {
        LedgerError::InvalidAmount {
            amount: amount.to_string(),
        }
    }

    pub fn insufficient_funds(account: AccountId, available: Amount, requested: Amount) -> Self {
        LedgerError::InsufficientFunds {
            account,
            available,
            requested,
        }
    }

    pub fn account_not_found(account: AccountId) -> Self {
        LedgerError::AccountNotFound { account }
    }

    pub fn account_already_exists(account: AccountId) -> Self {
        LedgerError::AccountAlreadyExists { account }
    }

    pub fn payout_not_found(payout: impl ToString) -> Self {
        LedgerError::PayoutNotFound {
            payout: payout.to_string(),
        }
    }

    pub fn invalid_state_transition(
        payout: PayoutId,
        from: PayoutStatus,
        action: PayoutAction,
    ) -> Self {
        LedgerError::InvalidStateTransition {
            payout,
            from,
            action,
        }
    }

    pub fn duplicate_reference(account: AccountId, reference: &str) -> Self {
        LedgerError::DuplicateReference {
            account,
            reference: reference.to_string(),
        }
    }

    pub fn concurrency_conflict(account: AccountId) -> Self {
        LedgerError::ConcurrencyConflict { account }
    }

    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    pub fn storage(message: impl ToString) -> Self {
        LedgerError::Storage {
            message: message.to_string(),
        }
    }

    pub fn invalid_command(command: &str, reason: impl ToString) -> Self {
        LedgerError::InvalidCommand {
            command: command.to_string(),
            reason: reason.to_string(),
        }
    }
}
