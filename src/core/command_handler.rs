//! Command dispatch
//!
//! Maps one parsed [`LedgerCommand`] onto the matching `WalletLedger` call.
//! Transition commands address payouts by the idempotency key they were
//! requested under, since replay files never know the generated payout id.

use crate::core::ledger::WalletLedger;
use crate::core::traits::LedgerStore;
use crate::types::{LedgerCommand, LedgerError};

impl<S: LedgerStore> WalletLedger<S> {
    /// Execute a single command
    ///
    /// # Errors
    ///
    /// Whatever the underlying ledger operation returns, plus
    /// `PayoutNotFound` when a transition names an unknown key.
    pub fn execute(&self, command: &LedgerCommand) -> Result<(), LedgerError> {
        match command {
            LedgerCommand::Open { account } => {
                self.open_account(*account)?;
            }
            LedgerCommand::Credit {
                account,
                amount,
                kind,
                description,
                reference,
            } => {
                self.credit(*account, *amount, *kind, description, reference.as_deref())?;
            }
            LedgerCommand::Payout {
                account,
                amount,
                method,
                destination,
                key: Some(key),
            } => {
                self.request_debit_with_key(*account, *amount, *method, destination, key)?;
            }
            LedgerCommand::Payout {
                account,
                amount,
                method,
                destination,
                key: None,
            } => {
                self.request_debit(*account, *amount, *method, destination)?;
            }
            LedgerCommand::Transition {
                account,
                key,
                action,
            } => {
                let payout = self
                    .find_payout_by_key(*account, key)?
                    .ok_or_else(|| LedgerError::payout_not_found(key))?;
                self.transition(payout.id, *action)?;
            }
        }
        Ok(())
    }
}
