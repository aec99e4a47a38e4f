use crate::core::ledger_store::LockMode;
use crate::core::retry::RetryPolicy;
use crate::strategy::{BatchConfig, LedgerConfig};
use crate::types::UserId;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Replay account operations against a seeded ledger
#[derive(Parser, Debug)]
#[command(name = "account-ledger")]
#[command(about = "Replay deposits, withdrawals and transfers against a seeded ledger", long_about = None)]
pub struct CliArgs {
    /// Operations CSV file path
    #[arg(value_name = "INPUT", help = "Path to the operations CSV file")]
    pub input_file: PathBuf,

    /// Seed CSV listing the accounts to open before replay
    #[arg(
        long = "accounts",
        value_name = "FILE",
        env = "LEDGER_ACCOUNTS",
        help = "Path to the account seed CSV (account,owner,currency)"
    )]
    pub accounts_file: PathBuf,

    /// Processing strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        env = "LEDGER_STRATEGY",
        help = "Processing strategy: 'sync' for synchronous or 'async' for asynchronous"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of runtime worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Attempts per operation when the store reports a conflict
    #[arg(
        long = "max-attempts",
        value_name = "COUNT",
        env = "LEDGER_MAX_ATTEMPTS",
        help = "Attempts per operation on store conflicts, including the first (default: 5)"
    )]
    pub max_attempts: Option<u32>,

    /// Backoff after the first conflict
    #[arg(
        long = "initial-backoff-ms",
        value_name = "MS",
        help = "Backoff after the first conflict in milliseconds (default: 2)"
    )]
    pub initial_backoff_ms: Option<u64>,

    /// Upper bound for any single backoff
    #[arg(
        long = "max-backoff-ms",
        value_name = "MS",
        help = "Upper bound for a single backoff in milliseconds (default: 100)"
    )]
    pub max_backoff_ms: Option<u64>,

    /// Store behaviour on contended account rows
    #[arg(
        long = "lock-mode",
        value_name = "MODE",
        default_value = "wait",
        env = "LEDGER_LOCK_MODE",
        help = "Contended rows: 'wait' to block or 'no-wait' to fail fast and retry"
    )]
    pub lock_mode: LockModeArg,

    /// Per-operation deadline
    #[arg(
        long = "timeout-ms",
        value_name = "MS",
        env = "LEDGER_TIMEOUT_MS",
        help = "Per-operation deadline in milliseconds (default: none)"
    )]
    pub timeout_ms: Option<u64>,

    /// Append this user's transaction history to the output
    #[arg(
        long = "history",
        value_name = "USER",
        help = "Also write the history of this user after the balances"
    )]
    pub history_user: Option<UserId>,

    /// Log filter directive
    #[arg(
        long = "log-level",
        value_name = "FILTER",
        env = "RUST_LOG",
        default_value = "warn",
        help = "Log filter for stderr, e.g. 'info' or 'account_ledger=debug'"
    )]
    pub log_level: String,
}

/// Available processing strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Store contention behaviour as accepted on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LockModeArg {
    Wait,
    NoWait,
}

impl From<LockModeArg> for LockMode {
    fn from(arg: LockModeArg) -> Self {
        match arg {
            LockModeArg::Wait => LockMode::Wait,
            LockModeArg::NoWait => LockMode::NoWait,
        }
    }
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Unset values use the defaults; zero values fall back to the defaults
    /// with a warning.
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

    /// Create a RetryPolicy from CLI arguments
    pub fn to_retry_policy(&self) -> RetryPolicy {
        let default = RetryPolicy::default();
        if self.max_attempts.is_none()
            && self.initial_backoff_ms.is_none()
            && self.max_backoff_ms.is_none()
        {
            return default;
        }

        RetryPolicy::new(
            self.max_attempts.unwrap_or(default.max_attempts),
            self.initial_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(default.initial_backoff),
            self.max_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(default.max_backoff),
        )
    }

    /// Create the ledger configuration shared by all strategies
    pub fn to_ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            accounts_path: self.accounts_file.clone(),
            retry: self.to_retry_policy(),
            lock_mode: self.lock_mode.into(),
            timeout: self.timeout_ms.map(Duration::from_millis),
            history_user: self.history_user,
        }
    }
}
