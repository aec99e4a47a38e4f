//! Core business logic module
//!
//! This module contains the ledger components:
//! - `traits` - Collaborator abstractions (account directory, ledger store)
//! - `engine` - Validation and atomic application of operations
//! - `history` - User-facing transaction history
//! - `context` - Per-request deadline and cancellation
//! - `retry` - Conflict retry policy
//! - `ledger_store` - In-memory directory and store implementation
//! - `async` - Tokio front end and batch processor

pub mod r#async;
pub mod context;
pub mod engine;
pub mod history;
pub mod ledger_store;
pub mod retry;
pub mod traits;

pub use context::RequestContext;
pub use engine::TransactionEngine;
pub use history::HistoryReader;
pub use ledger_store::{InMemoryLedger, LockMode};
pub use r#async::{AsyncTransactionEngine, BatchProcessor, ProcessingResult};
pub use retry::RetryPolicy;
pub use traits::{AccountDirectory, LedgerStore};
