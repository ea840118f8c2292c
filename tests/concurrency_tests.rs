//! Concurrency properties of the ledger
//!
//! Many threads (or tokio tasks) hammer the same accounts; afterwards every
//! balance must equal the sum of its transaction log, no balance may be
//! negative, and the successful debits may never exceed the funds that
//! existed.

use std::sync::Arc;
use std::thread;

use wallet_ledger::{
    AuditAction, LedgerConfig, LedgerError, MemoryAuditSink, PayoutMethod, PayoutStatus,
    TransactionKind, WalletLedger,
};

fn ledger() -> (WalletLedger, Arc<MemoryAuditSink>) {
    let sink = Arc::new(MemoryAuditSink::new());
    let ledger = WalletLedger::new(&LedgerConfig::new(5, 2000)).with_audit_sink(sink.clone());
    (ledger, sink)
}

#[test]
fn concurrent_debits_never_overdraw() {
    let (ledger, _) = ledger();
    ledger.open_account(1).unwrap();
    ledger
        .credit(1, 100_000, TransactionKind::SaleCredit, "bulk sales", None)
        .unwrap();

    let handles: Vec<_> = (0..16)
        .map(|worker| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                let mut reserved = 0;
                for round in 0..20 {
                    let amount = 500 + ((worker * 37 + round * 11) % 7) as i64 * 100;
                    match ledger.request_debit(1, amount, PayoutMethod::Momo, "0551234567") {
                        Ok(payout) => reserved += payout.amount,
                        Err(LedgerError::InsufficientFunds { .. }) => {}
                        Err(other) => panic!("unexpected error {other}"),
                    }
                }
                reserved
            })
        })
        .collect();

    let reserved: i64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert!(reserved <= 100_000);
    assert_eq!(ledger.balance(1).unwrap(), 100_000 - reserved);
    assert_eq!(ledger.summary(1).unwrap().reserved, i128::from(reserved));
    assert!(ledger.reconcile(1).unwrap());
}

#[test]
fn racing_debits_exactly_one_wins() {
    for _ in 0..50 {
        let (ledger, _) = ledger();
        ledger.open_account(1).unwrap();
        ledger
            .credit(1, 10_000, TransactionKind::SaleCredit, "sales", None)
            .unwrap();

        let outcomes: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| scope.spawn(|| ledger.request_debit(1, 6000, PayoutMethod::Bank, "GH-1")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, Err(LedgerError::InsufficientFunds { .. }))));
        assert_eq!(ledger.balance(1).unwrap(), 4000);
    }
}

#[test]
fn mixed_workload_keeps_every_account_reconciled() {
    let (ledger, sink) = ledger();
    for account in 1..=4 {
        ledger.open_account(account).unwrap();
    }

    thread::scope(|scope| {
        for worker in 0..8u32 {
            let ledger = &ledger;
            scope.spawn(move || {
                let account = worker % 4 + 1;
                for round in 0..25 {
                    ledger
                        .credit(account, 1000, TransactionKind::SaleCredit, "sale", None)
                        .unwrap();
                    if let Ok(payout) =
                        ledger.request_debit(account, 700, PayoutMethod::Momo, "0551234567")
                    {
                        let _ = if round % 2 == 0 {
                            ledger.reject(payout.id)
                        } else {
                            ledger.approve(payout.id)
                        };
                    }
                }
            });
        }
    });

    for reconciliation in ledger.reconcile_all().unwrap() {
        assert!(reconciliation.is_balanced(), "{:?}", reconciliation);
        assert!(reconciliation.stored >= 0);
    }

    let records = sink.records();
    let credits = records
        .iter()
        .filter(|r| r.action == AuditAction::Credit)
        .count();
    assert_eq!(credits, 8 * 25);

    let rejected = ledger
        .payouts(1, wallet_ledger::PageRequest::first(1000))
        .unwrap()
        .items
        .into_iter()
        .filter(|p| p.status == PayoutStatus::Rejected)
        .count();
    let rejects_audited = records
        .iter()
        .filter(|r| r.action == AuditAction::Reject && r.account_id == 1)
        .count();
    assert_eq!(rejected, rejects_audited);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tokio_tasks_share_the_ledger() {
    let (ledger, _) = ledger();
    ledger.open_account(9).unwrap();
    ledger
        .credit(9, 50_000, TransactionKind::Adjustment, "float", None)
        .unwrap();

    let tasks: Vec<_> = (0..32)
        .map(|task| {
            let ledger = ledger.clone();
            tokio::task::spawn_blocking(move || {
                ledger.request_debit_with_key(
                    9,
                    2000,
                    PayoutMethod::Bank,
                    "GH-0001",
                    &format!("task-{}", task % 16),
                )
            })
        })
        .collect();

    let mut succeeded = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    // Keys repeat, so only 16 distinct reservations exist
    assert_eq!(succeeded, 32);
    assert_eq!(ledger.balance(9).unwrap(), 50_000 - 16 * 2000);
    assert_eq!(ledger.summary(9).unwrap().transactions, 17);
}
