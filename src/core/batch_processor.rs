//! Batch processing with account-based partitioning
//!
//! `BatchProcessor` splits a batch of commands by account and replays each
//! partition on tokio's blocking pool. Commands for one account keep their
//! file order; commands for different accounts run concurrently.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── WalletLedger<S>   (shared, cheap to clone)
//!           ├── blocking task: account 1 → [open, credit, payout, approve, ...]
//!           ├── blocking task: account 2 → [open, credit, ...]
//!           └── ...
//! ```
//!
//! # Thread Safety
//!
//! Partitions never share an account, and the ledger's per-account units of
//! work serialize anything else that reaches the same account. Those units
//! may park the thread while waiting for an account lock, so partitions
//! never run on the async worker threads.

use std::collections::HashMap;
use tracing::{error, warn};

use crate::core::ledger::WalletLedger;
use crate::core::store::MemoryLedgerStore;
use crate::core::traits::LedgerStore;
use crate::types::{AccountId, LedgerCommand, LedgerError};

/// Outcome of one command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub command: LedgerCommand,

    pub result: Result<(), LedgerError>,
}

pub struct BatchProcessor<S: LedgerStore = MemoryLedgerStore> {
    ledger: WalletLedger<S>,
}

impl<S: LedgerStore> Clone for BatchProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
        }
    }
}

impl<S: LedgerStore + 'static> BatchProcessor<S> {
    pub fn new(ledger: WalletLedger<S>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &WalletLedger<S> {
        &self.ledger
    }

    /// Group commands by account, keeping their relative order
    pub fn partition_by_account(
        &self,
        batch: Vec<LedgerCommand>,
    ) -> HashMap<AccountId, Vec<LedgerCommand>> {
        let mut partitions: HashMap<AccountId, Vec<LedgerCommand>> = HashMap::new();
        for command in batch {
            partitions.entry(command.account()).or_default().push(command);
        }
        partitions
    }

    /// Replay one account's commands in order, blocking the calling thread
    ///
    /// A rejected command is logged and does not stop the partition.
    pub fn process_account_commands(
        &self,
        commands: Vec<LedgerCommand>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            let result = self.ledger.execute(&command);
            if let Err(error) = &result {
                warn!(
                    command = command.name(),
                    account = command.account(),
                    %error,
                    "command rejected"
                );
            }
            results.push(ProcessingResult { command, result });
        }
        results
    }

    /// Process a batch with one blocking task per account
    pub async fn process_batch(&self, batch: Vec<LedgerCommand>) -> Vec<ProcessingResult> {
        let partitions = self.partition_by_account(batch);

        let mut tasks = Vec::with_capacity(partitions.len());
        for (_account, commands) in partitions {
            let processor = self.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                processor.process_account_commands(commands)
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(account_results) => results.extend(account_results),
                Err(join_error) => error!(%join_error, "account task failed"),
            }
        }
        results
    }
}
