//! Wallet ledger service
//!
//! `WalletLedger` is the single entry point for balance mutations. Every
//! mutation runs as one unit of work on the owning account (see
//! [`crate::core::store`]), is retried on `ConcurrencyConflict`, and is
//! reported to the audit sink once committed.
//!
//! # Architecture
//!
//! ```text
//! WalletLedger
//!     ├── Arc<S: LedgerStore>   (per-account atomic units of work)
//!     ├── Arc<dyn AuditSink>    (best-effort compliance feed)
//!     └── RetryPolicy           (bounded conflict retries)
//! ```
//!
//! The ledger is cheap to clone and can be shared across threads and tokio
//! tasks.

use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::config::LedgerConfig;
use crate::core::audit::{AuditAction, AuditRecord, TracingAuditSink};
use crate::core::retry::RetryPolicy;
use crate::core::store::{AccountBook, MemoryLedgerStore};
use crate::core::traits::{AuditSink, LedgerStore};
use crate::types::{
    Account, AccountId, AccountSummary, Amount, LedgerError, Page, PageRequest, PayoutId,
    PayoutMethod, PayoutRequest, Reconciliation, Transaction, TransactionKind,
};

/// Seller wallet ledger
pub struct WalletLedger<S: LedgerStore = MemoryLedgerStore> {
    pub(super) store: Arc<S>,
    pub(super) audit: Arc<dyn AuditSink>,
    pub(super) retry: RetryPolicy,
}

impl WalletLedger<MemoryLedgerStore> {
    /// In-memory ledger that audits through `tracing`
    pub fn new(config: &LedgerConfig) -> Self {
        Self::with_store(
            Arc::new(MemoryLedgerStore::new(config.lock_wait)),
            Arc::new(TracingAuditSink),
            RetryPolicy::new(config.max_retries),
        )
    }
}

impl Default for WalletLedger<MemoryLedgerStore> {
    fn default() -> Self {
        Self::new(&LedgerConfig::default())
    }
}

impl<S: LedgerStore> Clone for WalletLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            audit: Arc::clone(&self.audit),
            retry: self.retry,
        }
    }
}

impl<S: LedgerStore> WalletLedger<S> {
    pub fn with_store(store: Arc<S>, audit: Arc<dyn AuditSink>, retry: RetryPolicy) -> Self {
        Self {
            store,
            audit,
            retry,
        }
    }

    /// Replace the audit sink
    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a seller account with a zero balance
    pub fn open_account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        let account = self.store.create_account(account_id)?;
        debug!(account = account_id, "account opened");
        Ok(account)
    }

    /// Post a positive entry and raise the balance by `amount`
    ///
    /// Only `SALE_CREDIT` and `ADJUSTMENT` may be credited by callers. When
    /// `reference_id` was already used for a credit on this account, an
    /// identical call returns the original transaction without writing
    /// anything; a different amount or kind is a `DuplicateReference`.
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `InvalidKind`, `AccountNotFound`, `DuplicateReference`,
    /// `ArithmeticOverflow`, `ConcurrencyConflict` (retries exhausted)
    pub fn credit(
        &self,
        account_id: AccountId,
        amount: Amount,
        kind: TransactionKind,
        description: &str,
        reference_id: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::invalid_amount(amount));
        }
        if !kind.is_caller_creditable() {
            return Err(LedgerError::InvalidKind { kind });
        }

        let (transaction, replayed) = self.retry.run("credit", account_id, || {
            self.store.transact(account_id, |unit| {
                if let Some(reference) = reference_id {
                    if let Some(existing) = unit.book().credit_by_reference(reference) {
                        return if existing.amount == amount && existing.kind == kind {
                            Ok((existing.clone(), true))
                        } else {
                            Err(LedgerError::duplicate_reference(account_id, reference))
                        };
                    }
                }

                let transaction = unit.append(
                    kind,
                    amount,
                    description.to_string(),
                    reference_id.map(str::to_string),
                )?;
                Ok((transaction, false))
            })
        })?;

        if replayed {
            debug!(
                account = account_id,
                transaction = transaction.id,
                "credit replayed, no new entry"
            );
        } else {
            self.emit(AuditRecord::new(
                AuditAction::Credit,
                account_id,
                amount,
                transaction.description.clone(),
            ));
        }
        Ok(transaction)
    }

    /// Reserve `amount` for a withdrawal
    ///
    /// The balance is read, checked and decremented inside one unit of work,
    /// together with the creation of the PENDING payout request and its
    /// `PAYOUT_REQUEST` entry. Concurrent calls on the same account can never
    /// reserve more than the balance held before they started.
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `InsufficientFunds`, `AccountNotFound`,
    /// `ConcurrencyConflict` (retries exhausted)
    pub fn request_debit(
        &self,
        account_id: AccountId,
        amount: Amount,
        method: PayoutMethod,
        destination: &str,
    ) -> Result<PayoutRequest, LedgerError> {
        self.debit(account_id, amount, method, destination, None)
    }

    /// `request_debit` under a caller idempotency key
    ///
    /// A repeated call with the same key returns the request created by the
    /// first call when amount, method and destination match, and fails with
    /// `DuplicateReference` otherwise.
    pub fn request_debit_with_key(
        &self,
        account_id: AccountId,
        amount: Amount,
        method: PayoutMethod,
        destination: &str,
        idempotency_key: &str,
    ) -> Result<PayoutRequest, LedgerError> {
        self.debit(account_id, amount, method, destination, Some(idempotency_key))
    }

    fn debit(
        &self,
        account_id: AccountId,
        amount: Amount,
        method: PayoutMethod,
        destination: &str,
        idempotency_key: Option<&str>,
    ) -> Result<PayoutRequest, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::invalid_amount(amount));
        }

        let (payout, replayed) = self.retry.run("request_debit", account_id, || {
            self.store.transact(account_id, |unit| {
                if let Some(key) = idempotency_key {
                    if let Some(existing) = unit.book().payout_by_key(key) {
                        return if existing.amount == amount
                            && existing.method == method
                            && existing.destination == destination
                        {
                            Ok((existing.clone(), true))
                        } else {
                            Err(LedgerError::duplicate_reference(account_id, key))
                        };
                    }
                }

                let available = unit.balance()?;
                if available < amount {
                    return Err(LedgerError::insufficient_funds(account_id, available, amount));
                }

                let payout = unit.open_payout(
                    amount,
                    method,
                    destination.to_string(),
                    idempotency_key.map(str::to_string),
                );
                unit.append(
                    TransactionKind::PayoutRequest,
                    -amount,
                    format!("Payout request #{} via {} to {}", payout.id, method, destination),
                    Some(payout.id.to_string()),
                )?;
                Ok((payout, false))
            })
        })?;

        if replayed {
            debug!(
                account = account_id,
                payout = payout.id,
                "payout request replayed, no new reservation"
            );
        } else {
            self.emit(AuditRecord::new(
                AuditAction::RequestDebit,
                account_id,
                amount,
                format!("Payout request #{} via {} to {}", payout.id, method, destination),
            ));
        }
        Ok(payout)
    }

    /// Whether the stored balance equals the sum of the transaction log
    ///
    /// Read-only. A mismatch is logged and reported, never corrected.
    pub fn reconcile(&self, account_id: AccountId) -> Result<bool, LedgerError> {
        Ok(self.reconciliation(account_id)?.is_balanced())
    }

    /// Stored balance next to the recomputed one
    pub fn reconciliation(&self, account_id: AccountId) -> Result<Reconciliation, LedgerError> {
        let reconciliation = self.read("reconcile", account_id, |book| book.reconciliation())?;
        if !reconciliation.is_balanced() {
            error!(
                account = account_id,
                stored = reconciliation.stored,
                computed = %reconciliation.computed,
                "balance does not match transaction history"
            );
        }
        Ok(reconciliation)
    }

    /// Reconcile every account, ascending by id
    pub fn reconcile_all(&self) -> Result<Vec<Reconciliation>, LedgerError> {
        self.store
            .account_ids()
            .into_iter()
            .map(|account_id| self.reconciliation(account_id))
            .collect()
    }

    pub fn account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.read("account", account_id, |book| book.account().clone())
    }

    /// Current spendable balance
    pub fn balance(&self, account_id: AccountId) -> Result<Amount, LedgerError> {
        self.read("balance", account_id, |book| book.balance())
    }

    pub fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.store
            .account_ids()
            .into_iter()
            .map(|account_id| self.account(account_id))
            .collect()
    }

    /// Transactions of an account, newest first
    pub fn transactions(
        &self,
        account_id: AccountId,
        page: PageRequest,
    ) -> Result<Page<Transaction>, LedgerError> {
        self.read("transactions", account_id, |book| {
            let log = book.transactions();
            Page::from_iter(log.iter().rev().cloned(), log.len(), page)
        })
    }

    /// Payout requests of an account, newest first
    pub fn payouts(
        &self,
        account_id: AccountId,
        page: PageRequest,
    ) -> Result<Page<PayoutRequest>, LedgerError> {
        self.read("payouts", account_id, |book| {
            let payouts = book.payouts();
            Page::from_iter(payouts.iter().rev().cloned(), payouts.len(), page)
        })
    }

    pub fn payout(&self, payout_id: PayoutId) -> Result<PayoutRequest, LedgerError> {
        let account_id = self
            .store
            .account_of_payout(payout_id)
            .ok_or_else(|| LedgerError::payout_not_found(payout_id))?;
        self.read("payout", account_id, |book| book.payout(payout_id).cloned())?
            .ok_or_else(|| LedgerError::payout_not_found(payout_id))
    }

    /// Payout request created under an idempotency key
    pub fn find_payout_by_key(
        &self,
        account_id: AccountId,
        key: &str,
    ) -> Result<Option<PayoutRequest>, LedgerError> {
        self.read("find_payout_by_key", account_id, |book| {
            book.payout_by_key(key).cloned()
        })
    }

    pub fn summary(&self, account_id: AccountId) -> Result<AccountSummary, LedgerError> {
        self.read("summary", account_id, |book| book.summary())
    }

    /// Summaries of every account, ascending by id
    pub fn summaries(&self) -> Result<Vec<AccountSummary>, LedgerError> {
        self.store
            .account_ids()
            .into_iter()
            .map(|account_id| self.summary(account_id))
            .collect()
    }

    /// The whole transaction log, by account then commit order
    pub fn journal(&self) -> Result<Vec<Transaction>, LedgerError> {
        let mut journal = Vec::new();
        for account_id in self.store.account_ids() {
            journal.extend(self.read("journal", account_id, |book| {
                book.transactions().to_vec()
            })?);
        }
        Ok(journal)
    }

    fn read<T, F>(&self, operation: &str, account_id: AccountId, f: F) -> Result<T, LedgerError>
    where
        F: Fn(&AccountBook) -> T,
    {
        self.retry
            .run(operation, account_id, || self.store.inspect(account_id, &f))
    }

    /// Deliver an audit record after commit; failures are only logged
    pub(super) fn emit(&self, record: AuditRecord) {
        if let Err(error) = self.audit.record(&record) {
            warn!(
                action = record.action.as_str(),
                account = record.account_id,
                amount = record.amount,
                %error,
                "audit emission failed, mutation stays committed"
            );
        }
    }
}
