//! Transaction-related types for the account ledger
//!
//! This module defines operation requests (what a caller asks for), ledger
//! entries (what the store records) and history entries (what a caller reads
//! back).

use super::account::{AccountId, CurrencyId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger entry identifier
///
/// Assigned by the store in commit order.
pub type EntryId = u64;

/// Kinds of balance-affecting operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Credit funds to an account owned by the caller
    Deposit,

    /// Debit funds from an account owned by the caller
    ///
    /// Requires a sufficient balance at the moment the debit is applied.
    Withdraw,

    /// Move funds between two accounts of the same currency
    ///
    /// The source must be owned by the caller; the destination may belong
    /// to anyone.
    Transfer,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Deposit => "deposit",
            OperationKind::Withdraw => "withdraw",
            OperationKind::Transfer => "transfer",
        };
        f.write_str(name)
    }
}

/// The accounts an operation touches
///
/// Each variant carries exactly the legs its kind requires, so a request
/// with a missing leg cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Deposit { to: AccountId },
    Withdraw { from: AccountId },
    Transfer { from: AccountId, to: AccountId },
}

/// A single balance-affecting request
///
/// Transient: it only lives for the duration of one `process_transaction`
/// call. The amount is signed so that zero and negative values survive
/// parsing and are rejected by the engine as `InvalidAmount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationRequest {
    pub operation: Operation,
    pub amount: i64,
}

impl OperationRequest {
    pub fn deposit(to: AccountId, amount: i64) -> Self {
        Self {
            operation: Operation::Deposit { to },
            amount,
        }
    }

    pub fn withdraw(from: AccountId, amount: i64) -> Self {
        Self {
            operation: Operation::Withdraw { from },
            amount,
        }
    }

    pub fn transfer(from: AccountId, to: AccountId, amount: i64) -> Self {
        Self {
            operation: Operation::Transfer { from, to },
            amount,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self.operation {
            Operation::Deposit { .. } => OperationKind::Deposit,
            Operation::Withdraw { .. } => OperationKind::Withdraw,
            Operation::Transfer { .. } => OperationKind::Transfer,
        }
    }

    /// The debited account, if any
    pub fn source(&self) -> Option<AccountId> {
        match self.operation {
            Operation::Deposit { .. } => None,
            Operation::Withdraw { from } | Operation::Transfer { from, .. } => Some(from),
        }
    }

    /// The credited account, if any
    pub fn destination(&self) -> Option<AccountId> {
        match self.operation {
            Operation::Withdraw { .. } => None,
            Operation::Deposit { to } | Operation::Transfer { to, .. } => Some(to),
        }
    }
}

/// A request together with the user issuing it
///
/// The unit of work read from operation streams and handed to the batch
/// processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationRecord {
    pub user: UserId,
    pub request: OperationRequest,
}

/// Which way a single-leg mutation moves the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Credit,
    Debit,
}

/// Immutable, append-only record of one balance-affecting event
///
/// Direction is encoded by which leg is populated, never by sign:
/// - deposit: `from` is `None`, `to` is set
/// - withdrawal: `from` is set, `to` is `None`
/// - transfer: both are set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub from: Option<AccountId>,
    pub to: Option<AccountId>,
    pub currency: CurrencyId,
    pub amount: u64,
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    /// Infer the operation kind from the populated legs
    ///
    /// Returns `None` for an entry with neither leg, which the store never
    /// writes.
    pub fn kind(&self) -> Option<OperationKind> {
        match (self.from, self.to) {
            (None, Some(_)) => Some(OperationKind::Deposit),
            (Some(_), None) => Some(OperationKind::Withdraw),
            (Some(_), Some(_)) => Some(OperationKind::Transfer),
            (None, None) => None,
        }
    }

    /// Whether either leg references the account
    pub fn touches(&self, account: AccountId) -> bool {
        self.from == Some(account) || self.to == Some(account)
    }
}

/// User-facing view of a ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub entry_id: EntryId,
    pub kind: OperationKind,
    pub from: Option<AccountId>,
    pub to: Option<AccountId>,
    pub currency_symbol: String,
    pub amount: u64,
    pub timestamp: DateTime<Utc>,
}
