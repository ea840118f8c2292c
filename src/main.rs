//! Wallet Ledger CLI
//!
//! Replays a CSV file of ledger commands (account openings, sale credits,
//! payout requests and settlement transitions) and prints the resulting
//! account summaries to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > accounts.csv
//! cargo run -- --strategy sync commands.csv > accounts.csv
//! cargo run -- --batch-size 2000 --max-concurrent 8 commands.csv > accounts.csv
//! cargo run -- --journal journal.csv commands.csv > accounts.csv
//! RUST_LOG=audit=info cargo run -- commands.csv
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, output not writable, etc.)

use std::fs::File;
use std::io::BufWriter;
use std::process;

use wallet_ledger::types::LedgerError;
use wallet_ledger::{cli, logging, strategy, write_accounts_csv, write_journal_csv};

fn run(args: &cli::CliArgs) -> Result<(), LedgerError> {
    let batch_config = if matches!(args.strategy, cli::StrategyType::Async) {
        Some(args.to_batch_config())
    } else {
        None
    };
    let strategy =
        strategy::create_strategy(args.strategy, batch_config, args.to_ledger_config());

    let ledger = strategy.run(&args.input_file)?;

    let mut output = std::io::stdout();
    write_accounts_csv(&ledger.summaries()?, &mut output)?;

    if let Some(path) = &args.journal {
        let mut journal = BufWriter::new(File::create(path)?);
        write_journal_csv(&ledger.journal()?, &mut journal)?;
    }

    Ok(())
}

fn main() {
    logging::init_logging();

    let args = cli::parse_args();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
