//! Payout request state machine
//!
//! Transitions are driven by the external settlement authority. Approving
//! and marking paid only move the status; rejecting also returns the
//! reserved funds with a `PAYOUT_REFUND` entry in the same unit of work.
//! Nothing here talks to a payment gateway.

use crate::core::audit::AuditRecord;
use crate::core::ledger::WalletLedger;
use crate::core::traits::LedgerStore;
use crate::types::{
    format_minor_units, LedgerError, PayoutAction, PayoutId, PayoutRequest, TransactionKind,
};

impl<S: LedgerStore> WalletLedger<S> {
    /// PENDING → APPROVED
    pub fn approve(&self, payout_id: PayoutId) -> Result<PayoutRequest, LedgerError> {
        self.transition(payout_id, PayoutAction::Approve)
    }

    /// PENDING → REJECTED, refunding the reserved amount
    pub fn reject(&self, payout_id: PayoutId) -> Result<PayoutRequest, LedgerError> {
        self.transition(payout_id, PayoutAction::Reject)
    }

    /// APPROVED → PAID, once external settlement has completed
    pub fn mark_paid(&self, payout_id: PayoutId) -> Result<PayoutRequest, LedgerError> {
        self.transition(payout_id, PayoutAction::MarkPaid)
    }

    /// Apply `action` to a payout request
    ///
    /// # Errors
    ///
    /// * `PayoutNotFound` - unknown payout id
    /// * `InvalidStateTransition` - the current status does not allow `action`
    /// * `ConcurrencyConflict` - the account stayed locked through every retry
    pub fn transition(
        &self,
        payout_id: PayoutId,
        action: PayoutAction,
    ) -> Result<PayoutRequest, LedgerError> {
        let account_id = self
            .store
            .account_of_payout(payout_id)
            .ok_or_else(|| LedgerError::payout_not_found(payout_id))?;

        let payout = self.retry.run(action.as_str(), account_id, || {
            self.store.transact(account_id, |unit| {
                let current = unit
                    .payout(payout_id)
                    .ok_or_else(|| LedgerError::payout_not_found(payout_id))?;
                let next = current.status.apply(action).ok_or_else(|| {
                    LedgerError::invalid_state_transition(payout_id, current.status, action)
                })?;

                let updated = unit.set_payout_status(payout_id, next)?;
                if action == PayoutAction::Reject {
                    unit.append(
                        TransactionKind::PayoutRefund,
                        current.amount,
                        format!("Refund of rejected payout request #{}", payout_id),
                        Some(payout_id.to_string()),
                    )?;
                }
                Ok(updated)
            })
        })?;

        let description = match action {
            PayoutAction::Approve => format!("Payout request #{} approved", payout.id),
            PayoutAction::Reject => format!(
                "Payout request #{} rejected, {} refunded",
                payout.id,
                format_minor_units(payout.amount)
            ),
            PayoutAction::MarkPaid => format!(
                "Payout request #{} paid via {} to {}",
                payout.id, payout.method, payout.destination
            ),
        };
        self.emit(AuditRecord::new(
            action.into(),
            account_id,
            payout.amount,
            description,
        ));
        Ok(payout)
    }
}
