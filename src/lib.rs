//! Account Ledger Library
//! # Overview
//!
//! This library keeps per-account balances that can only change through
//! validated deposits, withdrawals and transfers, each recorded as an
//! immutable ledger entry. A CSV replay front end runs operation files
//! through the engine with either a sync or an async strategy.
//!
//! # Architecture
//!
//! - [`types`] - Identifiers, accounts, requests, ledger entries, errors
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Validation and atomic application of operations
//!   - [`core::history`] - Transaction history with inferred operation kinds
//!   - [`core::traits`] - Account directory and ledger store abstractions
//!   - [`core::ledger_store`] - In-memory, row-locked implementation of both
//! - [`io`] - CSV readers, seeding and report output
//! - [`strategy`] - Sync and async replay pipelines
//! - [`cli`] - CLI argument parsing and log setup
//!
//! # Operations
//!
//! - **Deposit**: credit an account owned by the caller
//! - **Withdraw**: debit an account owned by the caller, never below zero
//! - **Transfer**: move funds from the caller's account to any account of
//!   the same currency, both legs in one atomic step
//!
//! A failed operation changes nothing and returns exactly one
//! [`LedgerError`].

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    AccountDirectory, HistoryReader, InMemoryLedger, LedgerStore, RequestContext, RetryPolicy,
    TransactionEngine,
};
pub use io::{write_accounts_csv, write_history_csv};
pub use types::{
    Account, AccountId, CurrencyId, ErrorKind, HistoryEntry, LedgerEntry, LedgerError,
    OperationKind, OperationRequest, StoreError, UserId,
};
