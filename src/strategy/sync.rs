//! Synchronous processing strategy
//!
//! Single-threaded replay. Orchestrates:
//! - account seeding via `LedgerConfig::open_ledger`
//! - CSV parsing via `SyncReader` (iterator interface)
//! - validation and mutation via `TransactionEngine`
//! - the report via `write_report`
//!
//! Operations are replayed strictly in file order, so the result is fully
//! deterministic for a given input.

use crate::core::engine::TransactionEngine;
use crate::core::history::HistoryReader;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{history_error, log_rejection, write_report, LedgerConfig, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Synchronous processing strategy
///
/// ```no_run
/// use account_ledger::strategy::{LedgerConfig, ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
///
/// let strategy = SyncProcessingStrategy::new(LedgerConfig::new("accounts.csv"));
/// strategy
///     .process(Path::new("operations.csv"), &mut std::io::stdout())
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    config: LedgerConfig,
}

impl SyncProcessingStrategy {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let ledger = self.config.open_ledger()?;
        let engine = TransactionEngine::new(Arc::clone(&ledger), Arc::clone(&ledger))
            .with_retry_policy(self.config.retry.clone());

        let reader = SyncReader::new(input_path)?;

        let mut applied = 0usize;
        let mut rejected = 0usize;
        for result in reader {
            match result {
                Ok(record) => {
                    let ctx = self.config.context();
                    match engine.process_transaction_in(&ctx, record.user, &record.request) {
                        Ok(_) => applied += 1,
                        Err(e) => {
                            rejected += 1;
                            log_rejection(&record, &e);
                        }
                    }
                }
                Err(e) => tracing::warn!(error = %e, "skipping operation row"),
            }
        }
        tracing::info!(applied, rejected, "replay finished");

        let history = match self.config.history_user {
            Some(user) => Some(
                HistoryReader::new(Arc::clone(&ledger), Arc::clone(&ledger))
                    .list_transactions(user)
                    .map_err(|e| history_error(user, e))?,
            ),
            None => None,
        };

        write_report(&ledger, history, output)
    }
}
