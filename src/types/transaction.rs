//! Transaction-related types for the wallet ledger
//!
//! Transactions are the immutable, signed entries of an account's ledger.
//! Once appended they are never edited or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::account::AccountId;
use super::money::Amount;

/// Transaction identifier, allocated from a store-wide sequence
pub type TransactionId = u64;

/// Kind of ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Proceeds of a finalized order
    SaleCredit,

    /// Funds reserved by a payout request (negative amount)
    PayoutRequest,

    /// Reserved funds returned after a payout was rejected
    PayoutRefund,

    /// Manual correction by an operator
    Adjustment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::SaleCredit => "SALE_CREDIT",
            TransactionKind::PayoutRequest => "PAYOUT_REQUEST",
            TransactionKind::PayoutRefund => "PAYOUT_REFUND",
            TransactionKind::Adjustment => "ADJUSTMENT",
        }
    }

    /// Whether external callers may post this kind through `credit`
    ///
    /// Payout debits and refunds are written by the ledger itself as part of
    /// the payout workflow.
    pub fn is_caller_creditable(&self) -> bool {
        matches!(self, TransactionKind::SaleCredit | TransactionKind::Adjustment)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    /// Owning account
    pub account_id: AccountId,

    /// Signed minor units: positive is a credit, negative a debit
    pub amount: Amount,

    pub kind: TransactionKind,

    /// Human-readable note
    pub description: String,

    /// Originating entity (order reference, payout id)
    pub reference_id: Option<String>,

    /// Non-decreasing per account, in commit order
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_credit(&self) -> bool {
        self.amount > 0
    }
}
