//! Replay strategies
//!
//! A strategy is a complete pipeline: seed the ledger, replay an operations
//! CSV through the engine, then write the final balances (and optionally one
//! user's history). Strategies are selected at runtime.

use crate::cli::StrategyType;
use crate::core::context::RequestContext;
use crate::core::ledger_store::{InMemoryLedger, LockMode};
use crate::core::retry::RetryPolicy;
use crate::io::csv_format::{write_accounts_csv, write_history_csv};
use crate::io::seed::load_accounts;
use crate::types::{HistoryEntry, LedgerError, OperationRecord, UserId};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete replay pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Replay operations from `input_path` and write the report to `output`
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the replay completed, even if individual operations
    ///   were rejected
    /// * `Err(String)` if a fatal error occurred (unreadable input or seed,
    ///   unknown history user, output failure)
    ///
    /// Rejected operations and malformed rows are logged and skipped.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Ledger settings shared by every strategy
#[derive(Clone, Debug, Default)]
pub struct LedgerConfig {
    /// Seed CSV listing the accounts to open before replay
    pub accounts_path: PathBuf,
    /// Conflict retry policy for the engine
    pub retry: RetryPolicy,
    /// Row contention behaviour of the store
    pub lock_mode: LockMode,
    /// Per-operation deadline
    pub timeout: Option<Duration>,
    /// User whose history is appended to the report
    pub history_user: Option<UserId>,
}

impl LedgerConfig {
    pub fn new(accounts_path: impl Into<PathBuf>) -> Self {
        Self {
            accounts_path: accounts_path.into(),
            ..Self::default()
        }
    }

    /// Build the ledger and open the seeded accounts
    pub fn open_ledger(&self) -> Result<Arc<InMemoryLedger>, String> {
        let ledger = InMemoryLedger::with_lock_mode(self.lock_mode);
        let opened = load_accounts(&self.accounts_path, &ledger)?;
        tracing::info!(
            accounts = opened,
            lock_mode = ?self.lock_mode,
            "ledger seeded"
        );
        Ok(Arc::new(ledger))
    }

    /// A fresh context for one operation
    pub fn context(&self) -> RequestContext {
        match self.timeout {
            Some(timeout) => RequestContext::with_timeout(timeout),
            None => RequestContext::background(),
        }
    }
}

/// Create a processing strategy based on the specified strategy type
///
/// `batch` is only used by the async strategy; `None` means defaults.
pub fn create_strategy(
    strategy_type: StrategyType,
    ledger: LedgerConfig,
    batch: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(ledger)),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(
            batch.unwrap_or_default(),
            ledger,
        )),
    }
}

/// Log one rejected operation
pub(crate) fn log_rejection(record: &OperationRecord, error: &LedgerError) {
    tracing::warn!(
        user = record.user,
        kind = %record.request.kind(),
        amount = record.request.amount,
        error = %error,
        "operation rejected"
    );
}

/// Write final balances, then the history listing if one was requested
pub(crate) fn write_report(
    ledger: &InMemoryLedger,
    history: Option<Vec<HistoryEntry>>,
    output: &mut dyn Write,
) -> Result<(), String> {
    let accounts = ledger
        .accounts()
        .map_err(|e| format!("Failed to snapshot accounts: {}", e))?;
    write_accounts_csv(&accounts, ledger, output)?;

    if let Some(history) = history {
        writeln!(output).map_err(|e| format!("Failed to write output: {}", e))?;
        write_history_csv(&history, output)?;
    }

    Ok(())
}

/// Turn a history lookup failure into a fatal strategy error
pub(crate) fn history_error(user: UserId, error: LedgerError) -> String {
    format!("Failed to list history for user {}: {}", user, error)
}
