//! Asynchronous batch replay strategy
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig   (batch_size, max_concurrent_batches)
//!     ├── LedgerConfig  (retry budget, lock wait)
//!     ├── AsyncReader   (batch CSV reading)
//!     └── BatchProcessor
//!           └── WalletLedger (per-account units of work)
//! ```
//!
//! Batches are processed one after another so that an account whose
//! commands span several batches still sees them in file order. Within a
//! batch, accounts are replayed in parallel on the tokio multi-threaded
//! runtime.

use std::path::Path;
use tracing::{debug, warn};

use crate::config::LedgerConfig;
use crate::core::{BatchProcessor, WalletLedger};
use crate::io::async_reader::AsyncReader;
use crate::strategy::ProcessingStrategy;
use crate::types::LedgerError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Commands read per batch
    pub batch_size: usize,
    /// Worker threads of the runtime
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Zero values fall back to the defaults with a warning
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(default = default.batch_size, "Invalid batch_size (0), using default");
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                default = default.max_concurrent_batches,
                "Invalid max_concurrent_batches (0), using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    ledger_config: LedgerConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, ledger_config: LedgerConfig) -> Self {
        Self {
            config,
            ledger_config,
        }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn run(&self, input_path: &Path) -> Result<WalletLedger, LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| LedgerError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        runtime.block_on(async {
            let processor = BatchProcessor::new(WalletLedger::new(&self.ledger_config));

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|error| match error.kind() {
                    std::io::ErrorKind::NotFound => LedgerError::FileNotFound {
                        path: input_path.display().to_string(),
                    },
                    _ => LedgerError::from(error),
                })?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut batches = 0usize;
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }
                batches += 1;
                let results = processor.process_batch(batch).await;
                debug!(
                    batch = batches,
                    commands = results.len(),
                    rejected = results.iter().filter(|r| r.result.is_err()).count(),
                    "batch processed"
                );
            }

            Ok(processor.ledger().clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_batch_config_zero_values_fall_back() {
        let config = BatchConfig::new(0, 0);
        assert_eq!(config, BatchConfig::default());

        let config = BatchConfig::new(10, 2);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_concurrent_batches, 2);
    }

    #[test]
    fn test_async_strategy_processes_multiple_accounts() {
        let file = create_temp_csv(
            "type,account,amount,reference,method,destination\n\
             open,1\n\
             open,2\n\
             credit,1,100.00\n\
             credit,2,200.00\n\
             payout,2,50.00,p-1,BANK,GH-0001\n",
        );
        let mut output = Vec::new();

        AsyncProcessingStrategy::default()
            .process(file.path(), &mut output)
            .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account,balance,reserved,transactions,reconciled\n\
             1,100.00,0.00,1,true\n\
             2,150.00,50.00,2,true\n"
        );
    }

    #[test]
    fn test_async_strategy_maintains_ordering_across_batches() {
        // Account 1 can only afford the second payout after the reject refund
        let file = create_temp_csv(
            "type,account,amount,reference,method,destination\n\
             open,1\n\
             open,2\n\
             credit,1,100.00\n\
             credit,2,10.00\n\
             payout,1,80.00,p-1,MOMO,0551234567\n\
             adjust,2,5.00\n\
             reject,1,,p-1\n\
             payout,1,90.00,p-2,MOMO,0551234567\n",
        );

        let strategy =
            AsyncProcessingStrategy::new(BatchConfig::new(2, 2), LedgerConfig::default());
        let ledger = strategy.run(file.path()).unwrap();

        assert_eq!(ledger.balance(1).unwrap(), 1000);
        assert_eq!(ledger.summary(1).unwrap().reserved, 9000);
        assert_eq!(ledger.balance(2).unwrap(), 1500);
        assert!(ledger.reconcile_all().unwrap().iter().all(|r| r.is_balanced()));
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let result = AsyncProcessingStrategy::default().run(Path::new("nonexistent.csv"));

        assert!(matches!(result, Err(LedgerError::FileNotFound { .. })));
    }
}
