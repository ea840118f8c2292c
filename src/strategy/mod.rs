//! Replay strategies
//!
//! A strategy is a complete pipeline: read commands from a CSV file, replay
//! them through a fresh `WalletLedger`, and hand the ledger back for
//! reporting. The pipeline is selected at runtime from the CLI.

use std::io::Write;
use std::path::Path;

use crate::cli::StrategyType;
use crate::config::LedgerConfig;
use crate::core::WalletLedger;
use crate::io::csv_format::write_accounts_csv;
use crate::types::LedgerError;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

pub trait ProcessingStrategy: Send + Sync {
    /// Replay every command in `input_path` into a new ledger
    ///
    /// Rejected commands and unparseable rows are logged and skipped; only
    /// failures that stop the whole replay are returned.
    fn run(&self, input_path: &Path) -> Result<WalletLedger, LedgerError>;

    /// Replay and write the account summaries as CSV
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError> {
        let ledger = self.run(input_path)?;
        write_accounts_csv(&ledger.summaries()?, output)
    }
}

pub fn create_strategy(
    strategy_type: StrategyType,
    batch_config: Option<BatchConfig>,
    ledger_config: LedgerConfig,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(ledger_config)),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(
            batch_config.unwrap_or_default(),
            ledger_config,
        )),
    }
}
