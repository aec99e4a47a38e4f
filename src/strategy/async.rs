//! Asynchronous batch processing strategy
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── LedgerConfig (seed, retry, lock mode, timeout, history)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (user partitioning)
//!         └── AsyncTransactionEngine (blocking-pool engine calls)
//! ```
//!
//! Batches are processed one after another, so a user's operations keep
//! their file order across batch boundaries. Within a batch, different users
//! run in parallel. Operations of different users that touch the same
//! account may therefore apply in a different order than in the file.

use crate::core::r#async::{AsyncTransactionEngine, BatchProcessor};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{history_error, log_rejection, write_report, LedgerConfig, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Configuration for batch processing
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of operations per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
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
    /// Create a new BatchConfig; zero values fall back to the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size,
                default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            tracing::warn!(
                "Invalid max_concurrent_batches ({}), using default ({})",
                max_concurrent_batches,
                default.max_concurrent_batches
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

/// Asynchronous batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    ledger: LedgerConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, ledger: LedgerConfig) -> Self {
        Self { config, ledger }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let ledger = self.ledger.open_ledger()?;
            let engine = AsyncTransactionEngine::new(
                Arc::clone(&ledger),
                Arc::clone(&ledger),
                self.ledger.retry.clone(),
            );
            let processor =
                BatchProcessor::new(engine.clone()).with_timeout(self.ledger.timeout);

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut applied = 0usize;
            let mut rejected = 0usize;
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                // Finish this batch before reading the next to keep per-user order
                for processed in processor.process_batch(batch).await {
                    match &processed.result {
                        Ok(_) => applied += 1,
                        Err(e) => {
                            rejected += 1;
                            log_rejection(&processed.record, e);
                        }
                    }
                }
            }
            tracing::info!(applied, rejected, "replay finished");

            let history = match self.ledger.history_user {
                Some(user) => Some(
                    engine
                        .list_transactions(user)
                        .await
                        .map_err(|e| history_error(user, e))?,
                ),
                None => None,
            };

            write_report(&ledger, history, output)
        })
    }
}
