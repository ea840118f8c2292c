//! Payout request types and the payout state machine rules
//!
//! A payout request reserves funds at creation (PENDING) and is then resolved
//! by an external settlement authority:
//!
//! ```text
//! PENDING ──approve──► APPROVED ──mark_paid──► PAID
//!    │
//!    └──reject──► REJECTED (reserved funds refunded)
//! ```
//!
//! PAID and REJECTED are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::account::AccountId;
use super::money::Amount;

/// Payout request identifier
pub type PayoutId = u64;

/// Channel used to move the money once a payout is approved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutMethod {
    /// Mobile money wallet
    Momo,
    /// Bank transfer
    Bank,
}

impl PayoutMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutMethod::Momo => "MOMO",
            PayoutMethod::Bank => "BANK",
        }
    }
}

impl fmt::Display for PayoutMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayoutMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "momo" => Ok(PayoutMethod::Momo),
            "bank" => Ok(PayoutMethod::Bank),
            other => Err(format!("Unknown payout method '{}'", other)),
        }
    }
}

/// Lifecycle state of a payout request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "PENDING",
            PayoutStatus::Approved => "APPROVED",
            PayoutStatus::Rejected => "REJECTED",
            PayoutStatus::Paid => "PAID",
        }
    }

    /// No transition leaves a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, PayoutStatus::Rejected | PayoutStatus::Paid)
    }

    /// Funds are still held for this request
    pub fn is_reserved(&self) -> bool {
        matches!(self, PayoutStatus::Pending | PayoutStatus::Approved)
    }

    /// State reached by applying `action`, or `None` if the transition is not allowed
    pub fn apply(self, action: PayoutAction) -> Option<PayoutStatus> {
        match (self, action) {
            (PayoutStatus::Pending, PayoutAction::Approve) => Some(PayoutStatus::Approved),
            (PayoutStatus::Pending, PayoutAction::Reject) => Some(PayoutStatus::Rejected),
            (PayoutStatus::Approved, PayoutAction::MarkPaid) => Some(PayoutStatus::Paid),
            _ => None,
        }
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transition requested by the settlement authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayoutAction {
    Approve,
    Reject,
    MarkPaid,
}

impl PayoutAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutAction::Approve => "approve",
            PayoutAction::Reject => "reject",
            PayoutAction::MarkPaid => "mark_paid",
        }
    }
}

impl fmt::Display for PayoutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A seller-initiated withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub id: PayoutId,
    pub account_id: AccountId,

    /// Positive minor units, reserved from the balance at creation
    pub amount: Amount,

    pub method: PayoutMethod,

    /// Phone number, IBAN, ... opaque to the ledger
    pub destination: String,

    pub status: PayoutStatus,

    /// Caller-supplied key that makes a retried request a no-op
    pub idempotency_key: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Time of the last status change
    pub updated_at: DateTime<Utc>,
}
