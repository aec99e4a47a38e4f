//! Error types for the account ledger
//!
//! Two closed enums live here:
//!
//! - [`LedgerError`] is what callers of the engine and history reader see.
//!   Callers switch on the variant (or on [`LedgerError::kind`]), never on
//!   the rendered message.
//! - [`StoreError`] is what ledger-store and directory implementations
//!   report. The engine translates it into a [`LedgerError`].
//!
//! # Error Categories
//!
//! - **Validation**: invalid amount, unknown account or user, ownership and
//!   currency violations, insufficient funds. Terminal for the call.
//! - **Transient**: a concurrent conflict aborted the atomic mutation. No
//!   partial effect occurred; the whole call may be retried.
//! - **Aborted**: the request context was cancelled or its deadline passed
//!   before a mutation started. No effect occurred.
//! - **Storage**: unrecoverable store failure. The operation did not take effect.

use super::account::{AccountId, CurrencyId, UserId};
use std::fmt;
use thiserror::Error;

/// Why an account was refused for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRejection {
    /// The caller does not own the account
    NotOwner,
    /// Source and destination of a transfer use different currencies
    CurrencyMismatch,
    /// Source and destination of a transfer are the same account
    SameAccount,
}

impl fmt::Display for AccountRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            AccountRejection::NotOwner => "not owned by caller",
            AccountRejection::CurrencyMismatch => "currency mismatch",
            AccountRejection::SameAccount => "source and destination are the same account",
        };
        f.write_str(reason)
    }
}

/// Plain tag for each [`LedgerError`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAmount,
    NoSuchAccount,
    InvalidAccount,
    NotEnoughMoney,
    NoSuchUser,
    Conflict,
    Store,
    Cancelled,
    DeadlineExceeded,
}

/// Caller-facing error for ledger operations
///
/// Every failed call returns exactly one of these. A returned error always
/// means no balance changed and no ledger entry was appended.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Amount is zero or negative, or too large to credit
    #[error("Invalid amount {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: i64,
    },

    /// A referenced account does not exist
    #[error("Account {account} does not exist")]
    NoSuchAccount {
        /// The missing account
        account: AccountId,
    },

    /// The account cannot be used by this caller for this operation
    #[error("Invalid account {account}: {reason}")]
    InvalidAccount {
        /// The refused account
        account: AccountId,
        /// Why it was refused
        reason: AccountRejection,
    },

    /// Source balance is lower than the requested amount
    #[error("Not enough money in account {account}: balance {balance}, requested {requested}")]
    NotEnoughMoney {
        /// The account being debited
        account: AccountId,
        /// Balance observed when the check failed
        balance: u64,
        /// Requested amount
        requested: u64,
    },

    /// A referenced user does not exist
    #[error("User {user} does not exist")]
    NoSuchUser {
        /// The missing user
        user: UserId,
    },

    /// The atomic mutation kept aborting on concurrent contention
    ///
    /// Nothing was applied; retrying the whole call is safe.
    #[error("Concurrent conflict persisted after {attempts} attempt(s)")]
    Conflict {
        /// How many attempts were made
        attempts: u32,
    },

    /// Unrecoverable storage failure
    #[error("Storage error: {message}")]
    Store {
        /// Description of the failure
        message: String,
    },

    /// The request was cancelled before a mutation started
    #[error("Request cancelled")]
    Cancelled,

    /// The request deadline passed before a mutation started
    #[error("Request deadline exceeded")]
    DeadlineExceeded,
}

impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: i64) -> Self {
        LedgerError::InvalidAmount { amount }
    }

    /// Create a NoSuchAccount error
    pub fn no_such_account(account: AccountId) -> Self {
        LedgerError::NoSuchAccount { account }
    }

    /// Create an InvalidAccount error
    pub fn invalid_account(account: AccountId, reason: AccountRejection) -> Self {
        LedgerError::InvalidAccount { account, reason }
    }

    /// Create a NotEnoughMoney error
    pub fn not_enough_money(account: AccountId, balance: u64, requested: u64) -> Self {
        LedgerError::NotEnoughMoney {
            account,
            balance,
            requested,
        }
    }

    /// Create a NoSuchUser error
    pub fn no_such_user(user: UserId) -> Self {
        LedgerError::NoSuchUser { user }
    }

    /// Create a Store error
    pub fn store(message: impl Into<String>) -> Self {
        LedgerError::Store {
            message: message.into(),
        }
    }

    /// The tag of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            LedgerError::NoSuchAccount { .. } => ErrorKind::NoSuchAccount,
            LedgerError::InvalidAccount { .. } => ErrorKind::InvalidAccount,
            LedgerError::NotEnoughMoney { .. } => ErrorKind::NotEnoughMoney,
            LedgerError::NoSuchUser { .. } => ErrorKind::NoSuchUser,
            LedgerError::Conflict { .. } => ErrorKind::Conflict,
            LedgerError::Store { .. } => ErrorKind::Store,
            LedgerError::Cancelled => ErrorKind::Cancelled,
            LedgerError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
        }
    }

    /// Whether retrying the whole call from scratch may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Conflict { .. })
    }
}

/// Error reported by ledger-store and directory implementations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The row(s) were contended and the mutation aborted without effect
    #[error("Conflict on account {account}")]
    Conflict { account: AccountId },

    /// The conditional debit failed against the current balance
    #[error("Insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        balance: u64,
        requested: u64,
    },

    /// The account is absent or was closed
    #[error("Account {account} not found")]
    AccountNotFound { account: AccountId },

    /// An account with this ID is already open
    #[error("Account {account} already exists")]
    DuplicateAccount { account: AccountId },

    /// A transfer named the same account on both legs
    #[error("Transfer from account {account} to itself")]
    SelfTransfer { account: AccountId },

    /// Crediting would overflow the balance
    #[error("Balance overflow on account {account}")]
    BalanceOverflow { account: AccountId },

    /// The user is not registered
    #[error("User {user} not found")]
    UserNotFound { user: UserId },

    /// No symbol is registered for the currency
    #[error("Currency {currency} not found")]
    CurrencyNotFound { currency: CurrencyId },

    /// The store cannot serve the request
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    /// Create an Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }
}

// Translation for failures that escape the engine's own mapping
impl From<StoreError> for LedgerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict { .. } => LedgerError::Conflict { attempts: 1 },
            StoreError::InsufficientFunds {
                account,
                balance,
                requested,
            } => LedgerError::not_enough_money(account, balance, requested),
            StoreError::AccountNotFound { account } => LedgerError::no_such_account(account),
            StoreError::SelfTransfer { account } => {
                LedgerError::invalid_account(account, AccountRejection::SameAccount)
            }
            StoreError::UserNotFound { user } => LedgerError::no_such_user(user),
            other => LedgerError::store(other.to_string()),
        }
    }
}
