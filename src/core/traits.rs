//! Collaborator traits consumed by the engine and the history reader
//!
//! The engine never touches balances directly. It reads account metadata
//! through an [`AccountDirectory`] and applies every mutation through a
//! [`LedgerStore`], whose mutation methods are the only atomic scope in the
//! system. Implementations must be shareable across threads.

use crate::types::{
    Account, AccountId, CurrencyId, Direction, LedgerEntry, StoreError, UserId,
};

/// Read-only view of accounts, users and currencies
///
/// Reads may be eventually consistent for display purposes. The engine uses
/// them for its up-front checks only; the authoritative balance check
/// happens again inside the [`LedgerStore`] mutation.
pub trait AccountDirectory: Send + Sync {
    /// Whether the account currently exists
    fn account_exists(&self, id: AccountId) -> Result<bool, StoreError>;

    /// Fetch an account snapshot, `None` if it does not exist
    fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Whether the user exists
    fn user_exists(&self, user: UserId) -> Result<bool, StoreError>;

    /// IDs of all accounts owned by the user
    fn accounts_owned_by(&self, user: UserId) -> Result<Vec<AccountId>, StoreError>;

    /// Display symbol of a currency
    fn currency_symbol(&self, currency: CurrencyId) -> Result<String, StoreError>;
}

/// Durable balances plus the append-only entry log
///
/// # Atomicity
///
/// Each mutation method is one indivisible unit: the balance check, the
/// balance update(s) and the entry append either all happen or none do.
/// A returned error always means nothing was written. Implementations must
/// re-read the balance inside the unit; a value read earlier by the caller
/// is advisory only.
pub trait LedgerStore: Send + Sync {
    /// Conditionally credit or debit one account and append its entry
    ///
    /// A debit fails with [`StoreError::InsufficientFunds`] when the current
    /// balance is lower than `amount`. The appended entry has only the leg
    /// matching `direction` populated.
    fn apply_single_leg(
        &self,
        account: AccountId,
        amount: u64,
        direction: Direction,
    ) -> Result<LedgerEntry, StoreError>;

    /// Debit `from`, credit `to` and append one two-legged entry, atomically
    ///
    /// Both rows must be acquired in a fixed order independent of which one
    /// is the source, so opposite-direction transfers cannot deadlock.
    fn apply_transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: u64,
    ) -> Result<LedgerEntry, StoreError>;

    /// All entries with a leg on any of the accounts, each at most once, in
    /// commit order
    fn list_entries(&self, accounts: &[AccountId]) -> Result<Vec<LedgerEntry>, StoreError>;
}
