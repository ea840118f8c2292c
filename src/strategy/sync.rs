//! Synchronous replay strategy
//!
//! Streams commands from `SyncReader` and executes them one at a time on the
//! calling thread, in file order. Memory stays proportional to the ledger,
//! not to the input file.

use std::path::Path;
use tracing::warn;

use crate::config::LedgerConfig;
use crate::core::WalletLedger;
use crate::io::sync_reader::SyncReader;
use crate::strategy::ProcessingStrategy;
use crate::types::LedgerError;

#[derive(Debug, Clone, Default)]
pub struct SyncProcessingStrategy {
    ledger_config: LedgerConfig,
}

impl SyncProcessingStrategy {
    pub fn new(ledger_config: LedgerConfig) -> Self {
        Self { ledger_config }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn run(&self, input_path: &Path) -> Result<WalletLedger, LedgerError> {
        let ledger = WalletLedger::new(&self.ledger_config);

        for row in SyncReader::new(input_path)? {
            match row {
                Ok(command) => {
                    if let Err(error) = ledger.execute(&command) {
                        warn!(
                            command = command.name(),
                            account = command.account(),
                            %error,
                            "command rejected"
                        );
                    }
                }
                Err(error) => warn!(%error, "skipping row"),
            }
        }

        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PayoutStatus;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_strategy_replays_payout_flow() {
        let file = create_temp_csv(
            "type,account,amount,reference,method,destination\n\
             open,1\n\
             credit,1,100.00,order-1\n\
             payout,1,40.00,p-1,MOMO,0551234567\n\
             approve,1,,p-1\n\
             paid,1,,p-1\n",
        );

        let ledger = SyncProcessingStrategy::default().run(file.path()).unwrap();

        assert_eq!(ledger.balance(1).unwrap(), 6000);
        let payout = ledger.find_payout_by_key(1, "p-1").unwrap().unwrap();
        assert_eq!(payout.status, PayoutStatus::Paid);
    }

    #[test]
    fn test_sync_strategy_writes_summaries() {
        let file = create_temp_csv(
            "type,account,amount,reference,method,destination\n\
             open,2\n\
             open,1\n\
             credit,1,100.00\n\
             payout,1,40.00,,BANK,GH-0001\n",
        );
        let mut output = Vec::new();

        SyncProcessingStrategy::default()
            .process(file.path(), &mut output)
            .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account,balance,reserved,transactions,reconciled\n\
             1,60.00,40.00,2,true\n\
             2,0.00,0.00,0,true\n"
        );
    }

    #[test]
    fn test_sync_strategy_skips_bad_rows_and_rejected_commands() {
        let file = create_temp_csv(
            "type,account,amount,reference,method,destination\n\
             open,1\n\
             credit,1,fifty\n\
             credit,1,50.00\n\
             payout,1,70.00,,MOMO,0551234567\n\
             approve,1,,missing\n",
        );

        let ledger = SyncProcessingStrategy::default().run(file.path()).unwrap();

        assert_eq!(ledger.balance(1).unwrap(), 5000);
        assert_eq!(ledger.summary(1).unwrap().transactions, 1);
    }

    #[test]
    fn test_sync_strategy_handles_missing_file() {
        let result = SyncProcessingStrategy::default().run(Path::new("nonexistent.csv"));

        assert!(matches!(result, Err(LedgerError::FileNotFound { .. })));
    }

    #[test]
    fn test_sync_strategy_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncProcessingStrategy>();
    }
}
