use crate::config::LedgerConfig;
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for the wallet ledger replay tool
#[derive(Parser, Debug)]
#[command(name = "wallet-ledger")]
#[command(about = "Replay wallet ledger commands and report seller balances", long_about = None)]
pub struct CliArgs {
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Replay strategy: 'sync' for sequential or 'async' for account-parallel batches"
    )]
    pub strategy: StrategyType,

    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Worker threads for batch processing (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    #[arg(
        long = "max-retries",
        value_name = "COUNT",
        help = "Retries of an operation after a concurrency conflict (default: 3)"
    )]
    pub max_retries: Option<u32>,

    #[arg(
        long = "lock-wait-ms",
        value_name = "MILLIS",
        help = "How long a unit of work waits for an account lock (default: 250)"
    )]
    pub lock_wait_ms: Option<u64>,

    #[arg(
        long = "journal",
        value_name = "PATH",
        help = "Also write the full transaction journal as CSV to this file"
    )]
    pub journal: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn to_ledger_config(&self) -> LedgerConfig {
        let default = LedgerConfig::default();
        LedgerConfig::new(
            self.max_retries.unwrap_or(default.max_retries),
            self.lock_wait_ms
                .unwrap_or(default.lock_wait.as_millis() as u64),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case::default_strategy(&["program", "input.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "input.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "input.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
    }

    #[rstest]
    #[case::all_defaults(&["program", "input.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(&["program", "--batch-size", "2000", "input.csv"], 2000, num_cpus::get())]
    #[case::custom_max_concurrent(&["program", "--max-concurrent", "8", "input.csv"], 1000, 8)]
    #[case::zero_batch_size(&["program", "--batch-size", "0", "input.csv"], 1000, num_cpus::get())]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_batch_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_max_concurrent);
    }

    #[rstest]
    #[case::defaults(&["program", "input.csv"], 3, 250)]
    #[case::no_retries(&["program", "--max-retries", "0", "input.csv"], 0, 250)]
    #[case::custom_wait(&["program", "--lock-wait-ms", "40", "input.csv"], 3, 40)]
    #[case::zero_wait(&["program", "--lock-wait-ms", "0", "input.csv"], 3, 250)]
    fn test_ledger_config_conversion(
        #[case] args: &[&str],
        #[case] expected_retries: u32,
        #[case] expected_wait_ms: u64,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_ledger_config();

        assert_eq!(config.max_retries, expected_retries);
        assert_eq!(config.lock_wait, Duration::from_millis(expected_wait_ms));
    }

    #[test]
    fn test_journal_path() {
        let parsed =
            CliArgs::try_parse_from(["program", "--journal", "out/journal.csv", "input.csv"])
                .unwrap();
        assert_eq!(parsed.journal, Some(PathBuf::from("out/journal.csv")));
    }

    #[rstest]
    #[case::missing_input(&["program"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "input.csv"])]
    #[case::negative_retries(&["program", "--max-retries", "-1", "input.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
