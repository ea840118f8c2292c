//! Audit records and the shipped audit sinks
//!
//! The ledger emits one record per successful mutation after its unit of
//! work commits. Delivery is best-effort.

use std::fmt;
use std::sync::Mutex;
use thiserror::Error;
use tracing::info;

use crate::core::traits::AuditSink;
use crate::types::{AccountId, Amount, PayoutAction};

/// Mutation being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    Credit,
    RequestDebit,
    Approve,
    Reject,
    MarkPaid,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Credit => "credit",
            AuditAction::RequestDebit => "request_debit",
            AuditAction::Approve => "approve",
            AuditAction::Reject => "reject",
            AuditAction::MarkPaid => "mark_paid",
        }
    }
}

impl From<PayoutAction> for AuditAction {
    fn from(action: PayoutAction) -> Self {
        match action {
            PayoutAction::Approve => AuditAction::Approve,
            PayoutAction::Reject => AuditAction::Reject,
            PayoutAction::MarkPaid => AuditAction::MarkPaid,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry for the compliance history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub action: AuditAction,
    pub account_id: AccountId,
    /// Minor units moved by the mutation (the payout amount for transitions)
    pub amount: Amount,
    pub description: String,
}

impl AuditRecord {
    pub fn new(
        action: AuditAction,
        account_id: AccountId,
        amount: Amount,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action,
            account_id,
            amount,
            description: description.into(),
        }
    }
}

/// Delivery failure of an audit sink
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Sink that writes each record as a structured `tracing` event
///
/// Events use the `audit` target so they can be routed separately with
/// `RUST_LOG=audit=info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        info!(
            target: "audit",
            action = record.action.as_str(),
            account = record.account_id,
            amount = record.amount,
            description = %record.description,
            "ledger mutation"
        );
        Ok(())
    }
}

/// Sink that keeps every record in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .map_err(|_| AuditError::Unavailable("audit buffer poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}
