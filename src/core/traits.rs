//! Core traits for ledger storage and audit emission
//!
//! `LedgerStore` is the storage seam: anything that can run a closure as one
//! serializable unit of work against a single account can back the ledger.
//! `AuditSink` is the outbound compliance feed.

use crate::core::audit::{AuditError, AuditRecord};
use crate::core::store::{AccountBook, AccountUnit};
use crate::types::{Account, AccountId, LedgerError, PayoutId};

/// Trait for durable account storage
///
/// Implementations must guarantee that a `transact` closure observes the
/// latest committed state of the account, that no other unit on the same
/// account commits in between its read and its write, and that an `Err` from
/// the closure leaves nothing behind. Units on different accounts must not
/// block each other.
pub trait LedgerStore: Send + Sync {
    /// Register a new account with a zero balance
    fn create_account(&self, account_id: AccountId) -> Result<Account, LedgerError>;

    /// Run `f` as one atomic unit of work against `account_id`
    ///
    /// Writes staged on the unit are applied only if `f` returns `Ok` and the
    /// resulting balance is non-negative.
    fn transact<T, F>(&self, account_id: AccountId, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut AccountUnit<'_>) -> Result<T, LedgerError>;

    /// Read a consistent snapshot of an account
    fn inspect<T, F>(&self, account_id: AccountId, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&AccountBook) -> T;

    /// Owning account of a payout request
    fn account_of_payout(&self, payout_id: PayoutId) -> Option<AccountId>;

    /// All registered account ids, ascending
    fn account_ids(&self) -> Vec<AccountId>;
}

/// Trait for the external audit feed
///
/// Called after a mutation has committed. Failures are logged by the ledger
/// and never roll the mutation back.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError>;
}
