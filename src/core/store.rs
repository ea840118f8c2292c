//! In-memory ledger storage with per-account units of work
//!
//! # Design
//!
//! Each account is an `AccountBook` aggregate (account row, transaction log,
//! payout requests) behind its own `Mutex`. The books live in a `DashMap`
//! keyed by account id; the map is only used to find the book, and the shard
//! lock is released before the account lock is taken, so units on different
//! accounts never wait on each other.
//!
//! A unit of work is an `AccountUnit`: it reads the committed book and
//! stages new transactions, new payout requests and status changes. The
//! store applies the staged writes to the book only after the closure has
//! returned `Ok` and the resulting balance has passed the non-negative check.
//! Read, check and write all happen while the same account lock is held.
//!
//! ```text
//! MemoryLedgerStore
//!     ├── DashMap<AccountId, Arc<Mutex<AccountBook>>>  (per-account lock)
//!     ├── DashMap<PayoutId, AccountId>                 (payout -> owner index)
//!     └── Sequences                                    (transaction / payout ids)
//! ```

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::core::traits::LedgerStore;
use crate::types::{
    Account, AccountId, AccountSummary, Amount, LedgerError, PayoutId, PayoutMethod,
    PayoutRequest, PayoutStatus, Reconciliation, Transaction, TransactionId, TransactionKind,
};

/// Spins before a waiting unit starts sleeping between lock attempts
const LOCK_SPINS: u32 = 64;

/// Sleep between lock attempts once spinning is exhausted
const LOCK_BACKOFF: Duration = Duration::from_micros(50);

/// Store-wide id sequences
///
/// Ids taken by a unit that later rolls back are not reused; gaps are
/// expected.
#[derive(Debug)]
pub struct Sequences {
    transactions: AtomicU64,
    payouts: AtomicU64,
}

impl Sequences {
    fn new() -> Self {
        Self {
            transactions: AtomicU64::new(1),
            payouts: AtomicU64::new(1),
        }
    }

    fn next_transaction(&self) -> TransactionId {
        self.transactions.fetch_add(1, Ordering::Relaxed)
    }

    fn next_payout(&self) -> PayoutId {
        self.payouts.fetch_add(1, Ordering::Relaxed)
    }
}

/// Per-account aggregate: the account row plus everything it owns
#[derive(Debug, Clone)]
pub struct AccountBook {
    account: Account,
    /// Append-only, in commit order
    transactions: Vec<Transaction>,
    /// In creation order
    payouts: Vec<PayoutRequest>,
    payout_positions: HashMap<PayoutId, usize>,
    /// Caller references of credits, pointing into `transactions`
    credit_references: HashMap<String, usize>,
    /// Idempotency keys of payout requests, pointing into `payouts`
    payout_keys: HashMap<String, usize>,
    /// Latest committed timestamp, keeps `created_at` non-decreasing
    last_activity: DateTime<Utc>,
}

impl AccountBook {
    pub fn new(account: Account) -> Self {
        let last_activity = account.created_at;
        Self {
            account,
            transactions: Vec::new(),
            payouts: Vec::new(),
            payout_positions: HashMap::new(),
            credit_references: HashMap::new(),
            payout_keys: HashMap::new(),
            last_activity,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn balance(&self) -> Amount {
        self.account.balance
    }

    /// Transaction log in commit order (oldest first)
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Payout requests in creation order (oldest first)
    pub fn payouts(&self) -> &[PayoutRequest] {
        &self.payouts
    }

    pub fn payout(&self, payout_id: PayoutId) -> Option<&PayoutRequest> {
        self.payout_positions
            .get(&payout_id)
            .map(|&position| &self.payouts[position])
    }

    /// Credit previously posted under `reference`
    pub fn credit_by_reference(&self, reference: &str) -> Option<&Transaction> {
        self.credit_references
            .get(reference)
            .map(|&position| &self.transactions[position])
    }

    /// Payout request previously created under `key`
    pub fn payout_by_key(&self, key: &str) -> Option<&PayoutRequest> {
        self.payout_keys
            .get(key)
            .map(|&position| &self.payouts[position])
    }

    /// Recompute the balance from the transaction log
    pub fn reconciliation(&self) -> Reconciliation {
        Reconciliation {
            account: self.account.id,
            stored: self.account.balance,
            computed: self
                .transactions
                .iter()
                .map(|transaction| i128::from(transaction.amount))
                .sum(),
            transactions: self.transactions.len(),
        }
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            account: self.account.id,
            balance: self.account.balance,
            reserved: self
                .payouts
                .iter()
                .filter(|payout| payout.status.is_reserved())
                .map(|payout| i128::from(payout.amount))
                .sum(),
            transactions: self.transactions.len(),
            reconciled: self.reconciliation().is_balanced(),
        }
    }

    /// Apply the writes of a finished unit, all or nothing
    ///
    /// Every check runs before the first mutation. Returns the ids of the
    /// payout requests the unit created.
    fn apply(&mut self, staged: StagedWrites) -> Result<Vec<PayoutId>, LedgerError> {
        let account_id = self.account.id;

        let delta: i128 = staged
            .transactions
            .iter()
            .map(|transaction| i128::from(transaction.amount))
            .sum();
        let next_balance = i128::from(self.account.balance) + delta;
        if next_balance < 0 {
            return Err(LedgerError::InvariantViolation {
                account: account_id,
                balance: next_balance,
            });
        }
        let next_balance = Amount::try_from(next_balance)
            .map_err(|_| LedgerError::arithmetic_overflow("commit", account_id))?;

        if let Some((missing, _)) = staged
            .status_changes
            .iter()
            .find(|(payout_id, _)| !self.payout_positions.contains_key(payout_id))
        {
            return Err(LedgerError::payout_not_found(missing));
        }

        for transaction in staged.transactions {
            if transaction.kind.is_caller_creditable() {
                if let Some(reference) = &transaction.reference_id {
                    self.credit_references
                        .insert(reference.clone(), self.transactions.len());
                }
            }
            self.transactions.push(transaction);
        }

        let mut opened = Vec::with_capacity(staged.payouts.len());
        for payout in staged.payouts {
            let position = self.payouts.len();
            if let Some(key) = &payout.idempotency_key {
                self.payout_keys.insert(key.clone(), position);
            }
            self.payout_positions.insert(payout.id, position);
            opened.push(payout.id);
            self.payouts.push(payout);
        }

        for (payout_id, status) in staged.status_changes {
            let position = self.payout_positions[&payout_id];
            let payout = &mut self.payouts[position];
            payout.status = status;
            payout.updated_at = staged.now;
        }

        self.account.balance = next_balance;
        self.last_activity = staged.now;

        Ok(opened)
    }
}

/// Writes collected by a unit of work, not yet visible to anyone
#[derive(Debug)]
struct StagedWrites {
    now: DateTime<Utc>,
    transactions: Vec<Transaction>,
    payouts: Vec<PayoutRequest>,
    status_changes: Vec<(PayoutId, PayoutStatus)>,
}

/// One atomic unit of work against a locked account
///
/// Reads see the committed book plus the unit's own staged writes.
pub struct AccountUnit<'a> {
    book: &'a AccountBook,
    sequences: &'a Sequences,
    staged: StagedWrites,
}

impl<'a> AccountUnit<'a> {
    fn new(book: &'a AccountBook, sequences: &'a Sequences) -> Self {
        let now = Utc::now().max(book.last_activity);
        Self {
            book,
            sequences,
            staged: StagedWrites {
                now,
                transactions: Vec::new(),
                payouts: Vec::new(),
                status_changes: Vec::new(),
            },
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.book.account.id
    }

    /// Committed state as of the start of the unit
    pub fn book(&self) -> &AccountBook {
        self.book
    }

    /// Timestamp stamped on everything this unit writes
    pub fn now(&self) -> DateTime<Utc> {
        self.staged.now
    }

    /// Balance including this unit's staged transactions
    pub fn balance(&self) -> Result<Amount, LedgerError> {
        self.staged
            .transactions
            .iter()
            .try_fold(self.book.account.balance, |balance, transaction| {
                balance.checked_add(transaction.amount)
            })
            .ok_or_else(|| LedgerError::arithmetic_overflow("balance", self.account_id()))
    }

    /// Stage a ledger entry
    pub fn append(
        &mut self,
        kind: TransactionKind,
        amount: Amount,
        description: String,
        reference_id: Option<String>,
    ) -> Result<Transaction, LedgerError> {
        self.balance()?
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow(kind.as_str(), self.account_id()))?;

        let transaction = Transaction {
            id: self.sequences.next_transaction(),
            account_id: self.account_id(),
            amount,
            kind,
            description,
            reference_id,
            created_at: self.staged.now,
        };
        self.staged.transactions.push(transaction.clone());
        Ok(transaction)
    }

    /// Stage a new PENDING payout request
    pub fn open_payout(
        &mut self,
        amount: Amount,
        method: PayoutMethod,
        destination: String,
        idempotency_key: Option<String>,
    ) -> PayoutRequest {
        let payout = PayoutRequest {
            id: self.sequences.next_payout(),
            account_id: self.account_id(),
            amount,
            method,
            destination,
            status: PayoutStatus::Pending,
            idempotency_key,
            created_at: self.staged.now,
            updated_at: self.staged.now,
        };
        self.staged.payouts.push(payout.clone());
        payout
    }

    /// Committed payout request with this unit's status change applied
    pub fn payout(&self, payout_id: PayoutId) -> Option<PayoutRequest> {
        let mut payout = self.book.payout(payout_id)?.clone();
        if let Some((_, status)) = self
            .staged
            .status_changes
            .iter()
            .rev()
            .find(|(id, _)| *id == payout_id)
        {
            payout.status = *status;
            payout.updated_at = self.staged.now;
        }
        Some(payout)
    }

    /// Stage a status change on a committed payout request
    pub fn set_payout_status(
        &mut self,
        payout_id: PayoutId,
        status: PayoutStatus,
    ) -> Result<PayoutRequest, LedgerError> {
        let mut payout = self
            .payout(payout_id)
            .ok_or_else(|| LedgerError::payout_not_found(payout_id))?;
        self.staged.status_changes.push((payout_id, status));
        payout.status = status;
        payout.updated_at = self.staged.now;
        Ok(payout)
    }

    fn into_staged(self) -> StagedWrites {
        self.staged
    }
}

/// Thread-safe in-memory implementation of `LedgerStore`
#[derive(Debug)]
pub struct MemoryLedgerStore {
    books: DashMap<AccountId, Arc<Mutex<AccountBook>>>,
    payout_accounts: DashMap<PayoutId, AccountId>,
    sequences: Sequences,
    lock_wait: Duration,
}

impl MemoryLedgerStore {
    /// Create an empty store
    ///
    /// `lock_wait` bounds how long a unit waits for a contended account
    /// before failing with `ConcurrencyConflict`.
    pub fn new(lock_wait: Duration) -> Self {
        Self {
            books: DashMap::new(),
            payout_accounts: DashMap::new(),
            sequences: Sequences::new(),
            lock_wait,
        }
    }

    fn cell(&self, account_id: AccountId) -> Result<Arc<Mutex<AccountBook>>, LedgerError> {
        self.books
            .get(&account_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LedgerError::account_not_found(account_id))
    }

    fn acquire<'c>(
        &self,
        account_id: AccountId,
        cell: &'c Mutex<AccountBook>,
    ) -> Result<MutexGuard<'c, AccountBook>, LedgerError> {
        let deadline = Instant::now() + self.lock_wait;
        let mut attempts: u32 = 0;

        loop {
            match cell.try_lock() {
                Ok(guard) => return Ok(guard),
                // The book only changes inside `apply`, after every check, so a
                // closure that panicked left it at its last committed state.
                Err(TryLockError::Poisoned(poisoned)) => {
                    warn!(account = account_id, "recovering poisoned account lock");
                    cell.clear_poison();
                    return Ok(poisoned.into_inner());
                }
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Err(LedgerError::concurrency_conflict(account_id));
                    }
                    if attempts < LOCK_SPINS {
                        thread::yield_now();
                    } else {
                        thread::sleep(LOCK_BACKOFF);
                    }
                    attempts = attempts.saturating_add(1);
                }
            }
        }
    }
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new(crate::config::LedgerConfig::default().lock_wait)
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn create_account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        match self.books.entry(account_id) {
            Entry::Occupied(_) => Err(LedgerError::account_already_exists(account_id)),
            Entry::Vacant(slot) => {
                let account = Account::new(account_id, Utc::now());
                slot.insert(Arc::new(Mutex::new(AccountBook::new(account.clone()))));
                Ok(account)
            }
        }
    }

    fn transact<T, F>(&self, account_id: AccountId, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut AccountUnit<'_>) -> Result<T, LedgerError>,
    {
        let cell = self.cell(account_id)?;
        let mut book = self.acquire(account_id, &cell)?;

        let (value, staged) = {
            let mut unit = AccountUnit::new(&*book, &self.sequences);
            let value = f(&mut unit)?;
            (value, unit.into_staged())
        };

        let writes = staged.transactions.len();
        let opened = book.apply(staged)?;
        for payout_id in opened {
            self.payout_accounts.insert(payout_id, account_id);
        }

        debug!(
            account = account_id,
            writes,
            balance = book.balance(),
            "unit of work committed"
        );
        Ok(value)
    }

    fn inspect<T, F>(&self, account_id: AccountId, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&AccountBook) -> T,
    {
        let cell = self.cell(account_id)?;
        let book = self.acquire(account_id, &cell)?;
        Ok(f(&*book))
    }

    fn account_of_payout(&self, payout_id: PayoutId) -> Option<AccountId> {
        self.payout_accounts
            .get(&payout_id)
            .map(|entry| *entry.value())
    }

    fn account_ids(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self.books.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_account(balance: Amount) -> MemoryLedgerStore {
        let store = MemoryLedgerStore::default();
        store.create_account(1).unwrap();
        if balance > 0 {
            store
                .transact(1, |unit| {
                    unit.append(TransactionKind::Adjustment, balance, "seed".to_string(), None)
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn test_create_account_starts_at_zero() {
        let store = MemoryLedgerStore::default();
        let account = store.create_account(5).unwrap();

        assert_eq!(account.balance, 0);
        assert_eq!(store.account_ids(), vec![5]);
    }

    #[test]
    fn test_create_account_twice_fails() {
        let store = MemoryLedgerStore::default();
        store.create_account(5).unwrap();

        assert_eq!(
            store.create_account(5).unwrap_err(),
            LedgerError::account_already_exists(5)
        );
    }

    #[test]
    fn test_transact_unknown_account() {
        let store = MemoryLedgerStore::default();
        let result = store.transact(9, |unit| unit.balance());

        assert_eq!(result.unwrap_err(), LedgerError::account_not_found(9));
    }

    #[test]
    fn test_commit_applies_transactions_and_balance() {
        let store = store_with_account(10000);

        store
            .transact(1, |unit| {
                unit.append(TransactionKind::SaleCredit, 2500, "order".to_string(), None)
            })
            .unwrap();

        let (balance, count) = store
            .inspect(1, |book| (book.balance(), book.transactions().len()))
            .unwrap();
        assert_eq!(balance, 12500);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_closure_error_rolls_back_everything() {
        let store = store_with_account(10000);

        let result: Result<(), LedgerError> = store.transact(1, |unit| {
            unit.append(TransactionKind::Adjustment, -4000, "debit".to_string(), None)?;
            unit.open_payout(4000, PayoutMethod::Momo, "0551234567".to_string(), None);
            Err(LedgerError::storage("simulated failure"))
        });
        assert!(result.is_err());

        let (balance, transactions, payouts) = store
            .inspect(1, |book| {
                (book.balance(), book.transactions().len(), book.payouts().len())
            })
            .unwrap();
        assert_eq!(balance, 10000);
        assert_eq!(transactions, 1);
        assert_eq!(payouts, 0);
    }

    #[test]
    fn test_negative_balance_refused_at_commit() {
        let store = store_with_account(1000);

        let result = store.transact(1, |unit| {
            unit.append(TransactionKind::Adjustment, -1001, "overdraw".to_string(), None)
        });

        assert_eq!(
            result.unwrap_err(),
            LedgerError::InvariantViolation {
                account: 1,
                balance: -1
            }
        );
        assert_eq!(store.inspect(1, |book| book.balance()).unwrap(), 1000);
    }

    #[test]
    fn test_unit_sees_its_own_staged_writes() {
        let store = store_with_account(1000);

        let seen = store
            .transact(1, |unit| {
                unit.append(TransactionKind::Adjustment, 500, "a".to_string(), None)?;
                unit.balance()
            })
            .unwrap();

        assert_eq!(seen, 1500);
    }

    #[test]
    fn test_payout_index_populated_on_commit() {
        let store = store_with_account(1000);

        let payout = store
            .transact(1, |unit| {
                Ok(unit.open_payout(
                    400,
                    PayoutMethod::Bank,
                    "GB00".to_string(),
                    Some("wd-1".to_string()),
                ))
            })
            .unwrap();

        assert_eq!(store.account_of_payout(payout.id), Some(1));
        let by_key = store
            .inspect(1, |book| book.payout_by_key("wd-1").cloned())
            .unwrap();
        assert_eq!(by_key, Some(payout));
    }

    #[test]
    fn test_status_change_on_unknown_payout() {
        let store = store_with_account(0);

        let result = store.transact(1, |unit| unit.set_payout_status(77, PayoutStatus::Approved));

        assert_eq!(result.unwrap_err(), LedgerError::payout_not_found(77));
    }

    #[test]
    fn test_created_at_is_non_decreasing() {
        let store = store_with_account(0);
        for i in 0..20 {
            store
                .transact(1, |unit| {
                    unit.append(TransactionKind::Adjustment, 1 + i, "tick".to_string(), None)
                })
                .unwrap();
        }

        let ordered = store
            .inspect(1, |book| {
                book.transactions()
                    .windows(2)
                    .all(|pair| pair[0].created_at <= pair[1].created_at)
            })
            .unwrap();
        assert!(ordered);
    }

    #[test]
    fn test_held_lock_times_out_as_conflict() {
        let store = MemoryLedgerStore::new(Duration::from_millis(20));
        store.create_account(1).unwrap();

        let cell = store.cell(1).unwrap();
        let _held = cell.lock().unwrap();

        let result = store.inspect(1, |book| book.balance());
        assert_eq!(result.unwrap_err(), LedgerError::concurrency_conflict(1));
    }

    #[test]
    fn test_panicking_unit_leaves_book_committed() {
        let store = store_with_account(5000);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.transact(1, |unit| -> Result<(), LedgerError> {
                unit.append(TransactionKind::Adjustment, 700, "staged".to_string(), None)?;
                panic!("unit failed after staging");
            })
        }));
        assert!(outcome.is_err());

        assert_eq!(store.inspect(1, |book| book.balance()).unwrap(), 5000);
        assert_eq!(store.inspect(1, |book| book.transactions().len()).unwrap(), 1);

        store
            .transact(1, |unit| {
                unit.append(TransactionKind::Adjustment, 1, "next".to_string(), None)
            })
            .unwrap();
        assert_eq!(store.inspect(1, |book| book.balance()).unwrap(), 5001);
    }

    #[test]
    fn test_other_accounts_not_blocked_by_held_lock() {
        let store = MemoryLedgerStore::new(Duration::from_millis(20));
        store.create_account(1).unwrap();
        store.create_account(2).unwrap();

        let cell = store.cell(1).unwrap();
        let _held = cell.lock().unwrap();

        assert_eq!(store.inspect(2, |book| book.balance()).unwrap(), 0);
    }

    #[test]
    fn test_concurrent_units_serialize_per_account() {
        let store = Arc::new(MemoryLedgerStore::default());
        store.create_account(1).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..100 {
                        store
                            .transact(1, |unit| {
                                unit.append(TransactionKind::Adjustment, 1, "inc".to_string(), None)
                            })
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let reconciliation = store.inspect(1, |book| book.reconciliation()).unwrap();
        assert_eq!(reconciliation.stored, 800);
        assert!(reconciliation.is_balanced());
    }
}
