//! Batch processing with user-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which runs a batch of
//! operations concurrently while keeping each user's operations in their
//! original order.
//!
//! # Design
//!
//! A batch is split into one partition per issuing user. Partitions run as
//! separate tokio tasks; inside a partition operations run one after another.
//! Operations of different users may still touch the same accounts (a
//! transfer into someone else's account, for instance); the store's row
//! locking keeps those interleavings safe.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     ├── AsyncTransactionEngine  (shared engine handle)
//!     ├── Option<Duration>        (per-operation timeout)
//!     └── CancellationToken       (parent of every operation's context)
//! ```

use std::collections::HashMap;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::AsyncTransactionEngine;
use crate::core::context::RequestContext;
use crate::core::traits::{AccountDirectory, LedgerStore};
use crate::types::{LedgerEntry, LedgerError, OperationRecord, UserId};

/// Result of processing a single operation
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The operation that was processed
    pub record: OperationRecord,

    /// The appended entry, or why nothing was applied
    pub result: Result<LedgerEntry, LedgerError>,
}

/// Batch processor with user-based partitioning
///
/// Cloneable and shareable across tasks; clones share the engine and the
/// cancellation token.
#[derive(Debug)]
pub struct BatchProcessor<D, S> {
    engine: AsyncTransactionEngine<D, S>,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl<D, S> BatchProcessor<D, S>
where
    D: AccountDirectory + 'static,
    S: LedgerStore + 'static,
{
    /// Create a new BatchProcessor with no per-operation timeout
    pub fn new(engine: AsyncTransactionEngine<D, S>) -> Self {
        Self {
            engine,
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Give every operation its own deadline, measured from when it starts
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cancel not-yet-started operations when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn engine(&self) -> &AsyncTransactionEngine<D, S> {
        &self.engine
    }

    /// Partition a batch of operations by issuing user
    ///
    /// # Guarantees
    ///
    /// - Each operation appears in exactly one partition
    /// - Operations keep their original relative order within a partition
    pub fn partition_by_user(
        &self,
        batch: Vec<OperationRecord>,
    ) -> HashMap<UserId, Vec<OperationRecord>> {
        let mut user_batches: HashMap<UserId, Vec<OperationRecord>> = HashMap::new();

        for record in batch {
            user_batches.entry(record.user).or_default().push(record);
        }

        user_batches
    }

    /// Process one user's operations sequentially
    ///
    /// Failures are captured in the results and do not stop the partition.
    /// Results are in input order.
    pub async fn process_user_operations(
        &self,
        operations: Vec<OperationRecord>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(operations.len());

        for record in operations {
            let result = self
                .engine
                .process_transaction(self.context(), record.user, record.request)
                .await;
            results.push(ProcessingResult { record, result });
        }

        results
    }

    /// Process a batch with user-based partitioning
    ///
    /// Results of different users may be interleaved in any order; results
    /// of one user stay in input order.
    pub async fn process_batch(&self, batch: Vec<OperationRecord>) -> Vec<ProcessingResult> {
        let user_batches = self.partition_by_user(batch);

        let mut tasks = Vec::with_capacity(user_batches.len());
        for (_user, operations) in user_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_user_operations(operations).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(user_results) => results.extend(user_results),
                Err(e) => tracing::error!(error = %e, "partition task failed"),
            }
        }

        results
    }

    fn context(&self) -> RequestContext {
        let ctx = match self.timeout {
            Some(timeout) => RequestContext::with_timeout(timeout),
            None => RequestContext::background(),
        };
        ctx.cancelled_by(self.cancel.child_token())
    }
}

impl<D, S> Clone for BatchProcessor<D, S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            timeout: self.timeout,
            cancel: self.cancel.clone(),
        }
    }
}
