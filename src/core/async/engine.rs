//! Tokio front end for the transaction engine
//!
//! This module provides the `AsyncTransactionEngine` struct, which exposes the
//! synchronous [`TransactionEngine`] and [`HistoryReader`] to async callers.
//!
//! # Architecture
//!
//! ```text
//! AsyncTransactionEngine
//!     ├── TransactionEngine  (validation, atomic mutation, retries)
//!     └── HistoryReader      (read-only history listing)
//! ```
//!
//! Engine calls can block on contended rows and sleep between retries, so
//! every call runs on tokio's blocking pool rather than on a runtime worker.
//!
//! # Cancellation
//!
//! The request context is only consulted before a mutation starts. A call
//! that has reached the store runs to completion even if the awaiting future
//! is dropped, so a `Cancelled` error is never reported for an applied change.

use std::sync::Arc;

use crate::core::context::RequestContext;
use crate::core::engine::TransactionEngine;
use crate::core::history::HistoryReader;
use crate::core::retry::RetryPolicy;
use crate::core::traits::{AccountDirectory, LedgerStore};
use crate::types::{AccountId, HistoryEntry, LedgerEntry, LedgerError, OperationRequest, UserId};

/// Async, cloneable handle over one engine and one history reader
///
/// Clones share the same directory and store.
#[derive(Debug)]
pub struct AsyncTransactionEngine<D, S> {
    engine: TransactionEngine<D, S>,
    history: HistoryReader<D, S>,
}

impl<D, S> AsyncTransactionEngine<D, S>
where
    D: AccountDirectory + 'static,
    S: LedgerStore + 'static,
{
    /// Create a new AsyncTransactionEngine
    ///
    /// # Arguments
    ///
    /// * `directory` - Account, user and currency lookups
    /// * `store` - Atomic balance mutations and the entry log
    /// * `retry` - Conflict retry policy for the wrapped engine
    pub fn new(directory: Arc<D>, store: Arc<S>, retry: RetryPolicy) -> Self {
        Self {
            engine: TransactionEngine::new(Arc::clone(&directory), Arc::clone(&store))
                .with_retry_policy(retry),
            history: HistoryReader::new(directory, store),
        }
    }

    /// The wrapped synchronous engine
    pub fn engine(&self) -> &TransactionEngine<D, S> {
        &self.engine
    }

    /// Validate and apply one request on the blocking pool
    ///
    /// Same semantics as [`TransactionEngine::process_transaction_in`].
    pub async fn process_transaction(
        &self,
        ctx: RequestContext,
        caller: UserId,
        request: OperationRequest,
    ) -> Result<LedgerEntry, LedgerError> {
        // Nothing to hand off if the caller already gave up
        ctx.check()?;

        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.process_transaction_in(&ctx, caller, &request))
            .await
            .map_err(|e| {
                tracing::error!(caller, error = %e, "engine task failed");
                LedgerError::store(format!("engine task failed: {}", e))
            })?
    }

    /// List the user's history on the blocking pool
    pub async fn list_transactions(&self, user: UserId) -> Result<Vec<HistoryEntry>, LedgerError> {
        let history = self.history.clone();
        tokio::task::spawn_blocking(move || history.list_transactions(user))
            .await
            .map_err(|e| LedgerError::store(format!("history task failed: {}", e)))?
    }

    /// List one owned account's history on the blocking pool
    pub async fn list_account_transactions(
        &self,
        user: UserId,
        account: AccountId,
    ) -> Result<Vec<HistoryEntry>, LedgerError> {
        let history = self.history.clone();
        tokio::task::spawn_blocking(move || history.list_account_transactions(user, account))
            .await
            .map_err(|e| LedgerError::store(format!("history task failed: {}", e)))?
    }
}

impl<D, S> Clone for AsyncTransactionEngine<D, S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            history: self.history.clone(),
        }
    }
}
