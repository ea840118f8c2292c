// CLI module
// Argument parsing for the replay binary

mod args;

pub use args::{CliArgs, StrategyType};

use clap::Parser;

pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
