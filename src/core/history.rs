//! Transaction history reader
//!
//! Rebuilds a user-facing list of operations from raw ledger entries. The
//! operation kind is not stored; it is inferred from which legs of an entry
//! are populated. Reading never writes.

use crate::core::traits::{AccountDirectory, LedgerStore};
use crate::types::{
    AccountId, AccountRejection, CurrencyId, HistoryEntry, LedgerEntry, LedgerError, UserId,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Lists ledger entries for a user's accounts
#[derive(Debug)]
pub struct HistoryReader<D, S> {
    directory: Arc<D>,
    store: Arc<S>,
}

impl<D, S> HistoryReader<D, S>
where
    D: AccountDirectory,
    S: LedgerStore,
{
    pub fn new(directory: Arc<D>, store: Arc<S>) -> Self {
        HistoryReader { directory, store }
    }

    /// Every entry touching any account the user owns, in commit order
    ///
    /// A transfer between two of the user's own accounts is listed once.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<HistoryEntry>)` - Possibly empty; no history is not an error
    /// * `Err(LedgerError::NoSuchUser)` - The user does not exist
    /// * `Err(LedgerError::Store)` - The store failed or holds an entry with
    ///   neither leg
    pub fn list_transactions(&self, user: UserId) -> Result<Vec<HistoryEntry>, LedgerError> {
        if !self.directory.user_exists(user)? {
            return Err(LedgerError::no_such_user(user));
        }

        let accounts = self.directory.accounts_owned_by(user)?;
        if accounts.is_empty() {
            return Ok(Vec::new());
        }

        let entries = self.store.list_entries(&accounts)?;
        tracing::debug!(user, accounts = accounts.len(), entries = entries.len(), "history listed");
        self.enrich(entries)
    }

    /// Entries touching one account, which the user must own
    ///
    /// # Returns
    ///
    /// * `Err(LedgerError::NoSuchAccount)` - The account does not exist
    /// * `Err(LedgerError::InvalidAccount)` - The user does not own it
    pub fn list_account_transactions(
        &self,
        user: UserId,
        account: AccountId,
    ) -> Result<Vec<HistoryEntry>, LedgerError> {
        let owned = self
            .directory
            .get_account(account)?
            .ok_or(LedgerError::no_such_account(account))?;
        if !owned.is_owned_by(user) {
            return Err(LedgerError::invalid_account(
                account,
                AccountRejection::NotOwner,
            ));
        }

        let entries = self.store.list_entries(&[account])?;
        self.enrich(entries)
    }

    fn enrich(&self, entries: Vec<LedgerEntry>) -> Result<Vec<HistoryEntry>, LedgerError> {
        // Histories are dominated by a handful of currencies
        let mut symbols: HashMap<CurrencyId, String> = HashMap::new();

        entries
            .into_iter()
            .map(|entry| -> Result<HistoryEntry, LedgerError> {
                let kind = entry.kind().ok_or_else(|| {
                    tracing::error!(entry = entry.id, "ledger entry has neither leg");
                    LedgerError::store(format!("Ledger entry {} has neither leg", entry.id))
                })?;

                let currency_symbol = match symbols.get(&entry.currency) {
                    Some(symbol) => symbol.clone(),
                    None => {
                        let symbol = self.directory.currency_symbol(entry.currency)?;
                        symbols.insert(entry.currency, symbol.clone());
                        symbol
                    }
                };

                Ok(HistoryEntry {
                    entry_id: entry.id,
                    kind,
                    from: entry.from,
                    to: entry.to,
                    currency_symbol,
                    amount: entry.amount,
                    timestamp: entry.timestamp,
                })
            })
            .collect()
    }
}

impl<D, S> Clone for HistoryReader<D, S> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            store: Arc::clone(&self.store),
        }
    }
}
