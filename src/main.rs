//! Account Ledger CLI
//!
//! Replays an operations CSV against a seeded in-memory ledger and prints
//! the final balances to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --accounts accounts.csv operations.csv > balances.csv
//! cargo run -- --accounts accounts.csv --strategy sync operations.csv
//! cargo run -- --accounts accounts.csv --lock-mode no-wait --max-attempts 10 operations.csv
//! cargo run -- --accounts accounts.csv --history 1 --log-level info operations.csv
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, unreadable input or seed, unknown history user)

use account_ledger::cli;
use account_ledger::strategy;
use std::process;

fn main() {
    let args = cli::parse_args();
    cli::init_logging(&args.log_level);

    let strategy = {
        let batch = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), args.to_ledger_config(), batch)
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
