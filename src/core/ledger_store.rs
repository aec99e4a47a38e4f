//! Thread-safe in-memory ledger store
//!
//! This module provides `InMemoryLedger`, an implementation of both
//! [`AccountDirectory`] and [`LedgerStore`] that keeps balances and the entry
//! log in process memory.
//!
//! # Design
//!
//! Account rows live in a `DashMap<AccountId, Arc<Mutex<AccountRow>>>`. The
//! map only resolves an ID to its row; the row mutex is the atomic scope for
//! every balance mutation. The shard guard is always dropped before a row
//! mutex is taken, so the two lock layers never nest.
//!
//! Lock order for a mutation is fixed: account rows by ascending ID, then the
//! entry log. Opposite-direction transfers between the same pair therefore
//! serialize instead of deadlocking.
//!
//! # Contention
//!
//! With [`LockMode::Wait`] a contended row blocks until free. With
//! [`LockMode::NoWait`] the mutation aborts at once with
//! [`StoreError::Conflict`], leaving retry to the caller.
//!
//! # Atomicity
//!
//! New balances are computed and checked, and the entry-log lock acquired,
//! before anything is written. The writes that follow cannot fail, so a
//! mutation either lands completely or not at all.

use crate::core::traits::{AccountDirectory, LedgerStore};
use crate::types::{
    Account, AccountId, CurrencyId, Direction, LedgerEntry, StoreError, UserId,
};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError,
};

/// How a mutation behaves when a row it needs is held by another mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// Block until the row is free
    #[default]
    Wait,
    /// Abort immediately with a conflict
    NoWait,
}

#[derive(Debug)]
struct AccountRow {
    account: Account,
    /// Set when the account is closed while a mutation still holds the row
    closed: bool,
}

/// In-memory ledger: account directory plus atomic balance store
#[derive(Debug)]
pub struct InMemoryLedger {
    accounts: DashMap<AccountId, Arc<Mutex<AccountRow>>>,
    users: DashMap<UserId, String>,
    currencies: DashMap<CurrencyId, String>,
    currency_ids: DashMap<String, CurrencyId>,
    entries: RwLock<Vec<LedgerEntry>>,
    next_account_id: AtomicU64,
    next_user_id: AtomicU64,
    next_currency_id: AtomicU32,
    lock_mode: LockMode,
}

impl InMemoryLedger {
    /// Create an empty ledger that blocks on contended rows
    pub fn new() -> Self {
        Self::with_lock_mode(LockMode::Wait)
    }

    /// Create an empty ledger with the given contention behaviour
    pub fn with_lock_mode(lock_mode: LockMode) -> Self {
        Self {
            accounts: DashMap::new(),
            users: DashMap::new(),
            currencies: DashMap::new(),
            currency_ids: DashMap::new(),
            entries: RwLock::new(Vec::new()),
            next_account_id: AtomicU64::new(1),
            next_user_id: AtomicU64::new(1),
            next_currency_id: AtomicU32::new(1),
            lock_mode,
        }
    }

    pub fn lock_mode(&self) -> LockMode {
        self.lock_mode
    }

    // === Directory management ===

    /// Register a new user and return its ID
    pub fn register_user(&self, name: &str) -> UserId {
        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        self.users.insert(id, name.to_string());
        id
    }

    /// Register a user under a known ID, keeping an existing name
    pub fn ensure_user(&self, id: UserId, name: &str) {
        self.next_user_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
        self.users.entry(id).or_insert_with(|| name.to_string());
    }

    /// Register a currency by symbol, returning the existing ID if known
    pub fn register_currency(&self, symbol: &str) -> CurrencyId {
        *self
            .currency_ids
            .entry(symbol.to_string())
            .or_insert_with(|| {
                let id = self.next_currency_id.fetch_add(1, Ordering::SeqCst);
                self.currencies.insert(id, symbol.to_string());
                id
            })
            .value()
    }

    /// Open a zero-balance account with the next free ID
    pub fn open_account(&self, owner: UserId, currency: CurrencyId) -> Result<Account, StoreError> {
        self.check_new_account(owner, currency)?;
        loop {
            let id = self.next_account_id.fetch_add(1, Ordering::SeqCst);
            // IDs handed out explicitly may sit ahead of the counter
            if let Ok(account) = self.insert_account(id, owner, currency) {
                return Ok(account);
            }
        }
    }

    /// Open a zero-balance account under a caller-chosen ID
    pub fn open_account_with_id(
        &self,
        id: AccountId,
        owner: UserId,
        currency: CurrencyId,
    ) -> Result<Account, StoreError> {
        self.check_new_account(owner, currency)?;
        let account = self.insert_account(id, owner, currency)?;
        self.next_account_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
        Ok(account)
    }

    /// Close an account and return its final state
    ///
    /// Later operations see the account as missing. A mutation that already
    /// resolved the row observes the closed flag once it holds the lock and
    /// fails with [`StoreError::AccountNotFound`].
    pub fn close_account(&self, id: AccountId) -> Result<Account, StoreError> {
        let (_, row) = self
            .accounts
            .remove(&id)
            .ok_or(StoreError::AccountNotFound { account: id })?;
        let mut guard = row
            .lock()
            .map_err(|_| poisoned_row(id))?;
        guard.closed = true;
        tracing::debug!(account = id, balance = guard.account.balance, "account closed");
        Ok(guard.account.clone())
    }

    /// Snapshot of every open account, sorted by ID
    pub fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        let mut accounts = Vec::with_capacity(self.accounts.len());
        for (id, row) in self.rows() {
            let guard = row.lock().map_err(|_| poisoned_row(id))?;
            if !guard.closed {
                accounts.push(guard.account.clone());
            }
        }
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }

    /// Number of entries in the log
    pub fn entry_count(&self) -> Result<usize, StoreError> {
        Ok(self.read_log()?.len())
    }

    fn check_new_account(&self, owner: UserId, currency: CurrencyId) -> Result<(), StoreError> {
        if !self.users.contains_key(&owner) {
            return Err(StoreError::UserNotFound { user: owner });
        }
        if !self.currencies.contains_key(&currency) {
            return Err(StoreError::CurrencyNotFound { currency });
        }
        Ok(())
    }

    fn insert_account(
        &self,
        id: AccountId,
        owner: UserId,
        currency: CurrencyId,
    ) -> Result<Account, StoreError> {
        let account = Account::new(id, owner, currency);
        match self.accounts.entry(id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateAccount { account: id }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(AccountRow {
                    account: account.clone(),
                    closed: false,
                })));
                Ok(account)
            }
        }
    }

    // === Row and log access ===

    fn row(&self, id: AccountId) -> Result<Arc<Mutex<AccountRow>>, StoreError> {
        self.accounts
            .get(&id)
            .map(|row| Arc::clone(row.value()))
            .ok_or(StoreError::AccountNotFound { account: id })
    }

    fn rows(&self) -> Vec<(AccountId, Arc<Mutex<AccountRow>>)> {
        self.accounts
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect()
    }

    /// Take a row for mutation, honouring the lock mode
    fn lock_row<'a>(
        &self,
        row: &'a Mutex<AccountRow>,
        id: AccountId,
    ) -> Result<MutexGuard<'a, AccountRow>, StoreError> {
        let guard = match self.lock_mode {
            LockMode::Wait => row.lock().map_err(|_| poisoned_row(id))?,
            LockMode::NoWait => match row.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::WouldBlock) => {
                    return Err(StoreError::Conflict { account: id })
                }
                Err(TryLockError::Poisoned(_)) => return Err(poisoned_row(id)),
            },
        };
        if guard.closed {
            return Err(StoreError::AccountNotFound { account: id });
        }
        Ok(guard)
    }

    fn write_log(&self) -> Result<RwLockWriteGuard<'_, Vec<LedgerEntry>>, StoreError> {
        self.entries
            .write()
            .map_err(|_| StoreError::unavailable("entry log lock poisoned"))
    }

    fn read_log(&self) -> Result<RwLockReadGuard<'_, Vec<LedgerEntry>>, StoreError> {
        self.entries
            .read()
            .map_err(|_| StoreError::unavailable("entry log lock poisoned"))
    }

    fn append(
        log: &mut Vec<LedgerEntry>,
        from: Option<AccountId>,
        to: Option<AccountId>,
        currency: CurrencyId,
        amount: u64,
    ) -> LedgerEntry {
        let entry = LedgerEntry {
            id: log.len() as u64 + 1,
            from,
            to,
            currency,
            amount,
            timestamp: Utc::now(),
        };
        log.push(entry.clone());
        entry
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned_row(id: AccountId) -> StoreError {
    StoreError::unavailable(format!("row lock for account {} poisoned", id))
}

impl AccountDirectory for InMemoryLedger {
    fn account_exists(&self, id: AccountId) -> Result<bool, StoreError> {
        Ok(self.accounts.contains_key(&id))
    }

    fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row = match self.row(id) {
            Ok(row) => row,
            Err(StoreError::AccountNotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let guard = row.lock().map_err(|_| poisoned_row(id))?;
        Ok((!guard.closed).then(|| guard.account.clone()))
    }

    fn user_exists(&self, user: UserId) -> Result<bool, StoreError> {
        Ok(self.users.contains_key(&user))
    }

    fn accounts_owned_by(&self, user: UserId) -> Result<Vec<AccountId>, StoreError> {
        let mut owned = Vec::new();
        for (id, row) in self.rows() {
            let guard = row.lock().map_err(|_| poisoned_row(id))?;
            if !guard.closed && guard.account.is_owned_by(user) {
                owned.push(id);
            }
        }
        owned.sort_unstable();
        Ok(owned)
    }

    fn currency_symbol(&self, currency: CurrencyId) -> Result<String, StoreError> {
        self.currencies
            .get(&currency)
            .map(|symbol| symbol.value().clone())
            .ok_or(StoreError::CurrencyNotFound { currency })
    }
}

impl LedgerStore for InMemoryLedger {
    fn apply_single_leg(
        &self,
        account: AccountId,
        amount: u64,
        direction: Direction,
    ) -> Result<LedgerEntry, StoreError> {
        debug_assert!(amount > 0, "ledger amounts are always positive");

        let row = self.row(account)?;
        let mut guard = self.lock_row(&row, account)?;

        let balance = guard.account.balance;
        let new_balance = match direction {
            Direction::Credit => balance
                .checked_add(amount)
                .ok_or(StoreError::BalanceOverflow { account })?,
            Direction::Debit => {
                balance
                    .checked_sub(amount)
                    .ok_or(StoreError::InsufficientFunds {
                        account,
                        balance,
                        requested: amount,
                    })?
            }
        };

        let mut log = self.write_log()?;
        let (from, to) = match direction {
            Direction::Credit => (None, Some(account)),
            Direction::Debit => (Some(account), None),
        };
        let entry = Self::append(&mut log, from, to, guard.account.currency, amount);
        guard.account.balance = new_balance;

        Ok(entry)
    }

    fn apply_transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: u64,
    ) -> Result<LedgerEntry, StoreError> {
        debug_assert!(amount > 0, "ledger amounts are always positive");

        if from == to {
            return Err(StoreError::SelfTransfer { account: from });
        }

        let (low, high) = if from < to { (from, to) } else { (to, from) };
        let low_row = self.row(low)?;
        let high_row = self.row(high)?;
        let mut low_guard = self.lock_row(&low_row, low)?;
        let mut high_guard = self.lock_row(&high_row, high)?;

        let (source, destination) = if from < to {
            (&mut *low_guard, &mut *high_guard)
        } else {
            (&mut *high_guard, &mut *low_guard)
        };

        let source_balance = source.account.balance;
        let new_source = source_balance
            .checked_sub(amount)
            .ok_or(StoreError::InsufficientFunds {
                account: from,
                balance: source_balance,
                requested: amount,
            })?;
        let new_destination = destination
            .account
            .balance
            .checked_add(amount)
            .ok_or(StoreError::BalanceOverflow { account: to })?;

        let mut log = self.write_log()?;
        let entry = Self::append(
            &mut log,
            Some(from),
            Some(to),
            source.account.currency,
            amount,
        );
        source.account.balance = new_source;
        destination.account.balance = new_destination;

        Ok(entry)
    }

    fn list_entries(&self, accounts: &[AccountId]) -> Result<Vec<LedgerEntry>, StoreError> {
        let wanted: HashSet<AccountId> = accounts.iter().copied().collect();
        let log = self.read_log()?;
        Ok(log
            .iter()
            .filter(|entry| {
                entry.from.is_some_and(|id| wanted.contains(&id))
                    || entry.to.is_some_and(|id| wanted.contains(&id))
            })
            .cloned()
            .collect())
    }
}
