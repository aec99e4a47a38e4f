//! Account-related types for the account ledger
//!
//! This module defines the Account structure and the identifiers used to
//! address accounts, their owners and their currencies.

use serde::Serialize;

/// Account identifier
pub type AccountId = u64;

/// User identifier
///
/// Resolved by the authentication layer before the engine is invoked; the
/// engine trusts the supplied value.
pub type UserId = u64;

/// Currency identifier
pub type CurrencyId = u32;

/// Account state as seen by the engine
///
/// Balances are held in the smallest currency unit. The unsigned type makes
/// a negative balance unrepresentable; every mutation uses checked arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// The account ID
    pub id: AccountId,

    /// The user that owns this account
    ///
    /// Only the owner may deposit into, withdraw from or transfer out of
    /// the account.
    pub owner: UserId,

    /// The currency this account is denominated in
    ///
    /// Transfers are only allowed between accounts sharing a currency.
    pub currency: CurrencyId,

    /// Current balance in minor units
    pub balance: u64,
}

impl Account {
    /// Create a new account with a zero balance
    ///
    /// # Arguments
    ///
    /// * `id` - The account ID
    /// * `owner` - The owning user
    /// * `currency` - The denomination of the account
    pub fn new(id: AccountId, owner: UserId, currency: CurrencyId) -> Self {
        Account {
            id,
            owner,
            currency,
            balance: 0,
        }
    }

    /// Whether the given user owns this account
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }
}
