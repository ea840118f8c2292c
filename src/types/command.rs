//! Ledger commands as read from a replay file
//!
//! Each command maps onto one call of the ledger's public API: fulfillment
//! credits, seller payout requests, and settlement-authority transitions.

use super::account::AccountId;
use super::money::Amount;
use super::payout::{PayoutAction, PayoutMethod};
use super::transaction::TransactionKind;

/// A single parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCommand {
    /// Register a seller account
    Open { account: AccountId },

    /// Post a credit (`SALE_CREDIT` or `ADJUSTMENT`)
    Credit {
        account: AccountId,
        amount: Amount,
        kind: TransactionKind,
        description: String,
        reference: Option<String>,
    },

    /// Request a payout, optionally under an idempotency key
    Payout {
        account: AccountId,
        amount: Amount,
        method: PayoutMethod,
        destination: String,
        key: Option<String>,
    },

    /// Move the payout identified by `key` through the state machine
    Transition {
        account: AccountId,
        key: String,
        action: PayoutAction,
    },
}

impl LedgerCommand {
    /// The account this command touches
    pub fn account(&self) -> AccountId {
        match self {
            LedgerCommand::Open { account }
            | LedgerCommand::Credit { account, .. }
            | LedgerCommand::Payout { account, .. }
            | LedgerCommand::Transition { account, .. } => *account,
        }
    }

    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            LedgerCommand::Open { .. } => "open",
            LedgerCommand::Credit {
                kind: TransactionKind::Adjustment,
                ..
            } => "adjust",
            LedgerCommand::Credit { .. } => "credit",
            LedgerCommand::Payout { .. } => "payout",
            LedgerCommand::Transition { action, .. } => action.as_str(),
        }
    }
}
