//! Account-related types for the wallet ledger
//!
//! An account is a materialized view over its transaction stream: the
//! `balance` field is a cache that always equals the signed sum of the
//! account's transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::Amount;

/// Seller (store) account identifier
pub type AccountId = u32;

/// Seller wallet state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The account ID
    pub id: AccountId,

    /// Spendable balance in minor currency units
    ///
    /// Never negative in any committed state.
    pub balance: Amount,

    /// When the seller registered
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with a zero balance
    pub fn new(id: AccountId, created_at: DateTime<Utc>) -> Self {
        Account {
            id,
            balance: 0,
            created_at,
        }
    }
}

/// Point-in-time view of an account used for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub account: AccountId,

    /// Cached balance
    pub balance: Amount,

    /// Funds held by payout requests that are still PENDING or APPROVED
    ///
    /// Widened like [`Reconciliation::computed`]: each request fits in an
    /// `Amount` but their total may not.
    pub reserved: i128,

    /// Number of ledger entries
    pub transactions: usize,

    /// Whether the cached balance matches the transaction history
    pub reconciled: bool,
}

/// Outcome of recomputing an account's balance from its history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub account: AccountId,

    /// Balance stored on the account
    pub stored: Amount,

    /// Sum of all transaction amounts
    pub computed: i128,

    pub transactions: usize,
}

impl Reconciliation {
    /// True when the stored balance equals the recomputed sum
    pub fn is_balanced(&self) -> bool {
        i128::from(self.stored) == self.computed
    }
}
