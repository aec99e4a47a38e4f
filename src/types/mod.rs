//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account state and identifiers
//! - `transaction`: Operation requests, ledger entries and history entries
//! - `error`: Error types for the engine and for store implementations

pub mod account;
pub mod error;
pub mod transaction;

pub use account::{Account, AccountId, CurrencyId, UserId};
pub use error::{AccountRejection, ErrorKind, LedgerError, StoreError};
pub use transaction::{
    Direction, EntryId, HistoryEntry, LedgerEntry, Operation, OperationKind, OperationRecord,
    OperationRequest,
};
