//! Transaction processing engine
//!
//! This module provides the `TransactionEngine` that validates balance-affecting
//! requests and applies them through a [`LedgerStore`].
//!
//! The engine enforces, in order (first failure wins):
//! 1. The amount is positive
//! 2. Every referenced account exists
//! 3. The caller owns the debited account (or the credited one for deposits)
//! 4. Transfer legs share a currency and are distinct accounts
//! 5. The debited account holds at least the amount
//!
//! Check 5 is advisory: the store repeats it against the current balance
//! inside the atomic mutation, and that result is the one that counts. The
//! engine keeps no balance state between calls.
//!
//! A store conflict re-runs the whole call, validation included, under the
//! configured [`RetryPolicy`].

use crate::core::context::RequestContext;
use crate::core::retry::RetryPolicy;
use crate::core::traits::{AccountDirectory, LedgerStore};
use crate::types::{
    Account, AccountId, AccountRejection, Direction, LedgerEntry, LedgerError, Operation,
    OperationRequest, StoreError, UserId,
};
use std::sync::Arc;

/// Transaction processing engine
///
/// Cheap to share: clone the `Arc`s it was built from, or wrap the engine in
/// an `Arc` itself. Every method takes `&self`.
#[derive(Debug)]
pub struct TransactionEngine<D, S> {
    directory: Arc<D>,
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<D, S> TransactionEngine<D, S>
where
    D: AccountDirectory,
    S: LedgerStore,
{
    /// Create a new TransactionEngine with the default retry policy
    ///
    /// # Arguments
    ///
    /// * `directory` - Account, user and currency lookups
    /// * `store` - Atomic balance mutations and the entry log
    pub fn new(directory: Arc<D>, store: Arc<S>) -> Self {
        TransactionEngine {
            directory,
            store,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Process a request with no deadline
    ///
    /// See [`TransactionEngine::process_transaction_in`].
    pub fn process_transaction(
        &self,
        caller: UserId,
        request: &OperationRequest,
    ) -> Result<LedgerEntry, LedgerError> {
        self.process_transaction_in(&RequestContext::background(), caller, request)
    }

    /// Validate and apply a single request on behalf of `caller`
    ///
    /// # Arguments
    ///
    /// * `ctx` - Deadline and cancellation for this request
    /// * `caller` - The authenticated user issuing the request
    /// * `request` - The operation and its amount
    ///
    /// # Returns
    ///
    /// * `Ok(LedgerEntry)` - The entry appended alongside the balance change
    /// * `Err(LedgerError)` - Nothing was changed; see the variant for why
    ///
    /// Submitting the same request twice applies it twice. Deduplication, if
    /// wanted, belongs to the caller.
    pub fn process_transaction_in(
        &self,
        ctx: &RequestContext,
        caller: UserId,
        request: &OperationRequest,
    ) -> Result<LedgerEntry, LedgerError> {
        let amount = positive_amount(request.amount)?;

        let mut attempts = 0;
        loop {
            ctx.check()?;
            attempts += 1;

            match self.attempt(ctx, caller, request, amount) {
                Ok(entry) => {
                    tracing::debug!(
                        caller,
                        kind = %request.kind(),
                        amount,
                        entry = entry.id,
                        attempts,
                        "operation applied"
                    );
                    return Ok(entry);
                }
                Err(LedgerError::Conflict { .. }) if self.retry.allows_another(attempts) => {
                    let backoff = self.retry.backoff(attempts);
                    if ctx.remaining().is_some_and(|left| left <= backoff) {
                        return Err(LedgerError::DeadlineExceeded);
                    }
                    tracing::warn!(
                        caller,
                        kind = %request.kind(),
                        attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        "conflict, retrying"
                    );
                    std::thread::sleep(backoff);
                }
                Err(LedgerError::Conflict { .. }) => {
                    tracing::warn!(caller, kind = %request.kind(), attempts, "conflict retries exhausted");
                    return Err(LedgerError::Conflict { attempts });
                }
                Err(e) => {
                    if let LedgerError::Store { message } = &e {
                        tracing::error!(caller, kind = %request.kind(), %message, "store failure");
                    }
                    return Err(e);
                }
            }
        }
    }

    /// One validation pass plus one atomic mutation
    fn attempt(
        &self,
        ctx: &RequestContext,
        caller: UserId,
        request: &OperationRequest,
        amount: u64,
    ) -> Result<LedgerEntry, LedgerError> {
        match request.operation {
            Operation::Deposit { to } => {
                let destination = self.existing(to)?;
                ensure_owner(&destination, caller)?;

                ctx.check()?;
                self.store
                    .apply_single_leg(to, amount, Direction::Credit)
                    .map_err(|e| mutation_error(e, request.amount))
            }
            Operation::Withdraw { from } => {
                let source = self.existing(from)?;
                ensure_owner(&source, caller)?;
                ensure_funds(&source, amount)?;

                ctx.check()?;
                self.store
                    .apply_single_leg(from, amount, Direction::Debit)
                    .map_err(|e| mutation_error(e, request.amount))
            }
            Operation::Transfer { from, to } => {
                let source = self.existing(from)?;
                let destination = self.existing(to)?;
                ensure_owner(&source, caller)?;
                if destination.currency != source.currency {
                    return Err(LedgerError::invalid_account(
                        to,
                        AccountRejection::CurrencyMismatch,
                    ));
                }
                if from == to {
                    return Err(LedgerError::invalid_account(
                        to,
                        AccountRejection::SameAccount,
                    ));
                }
                ensure_funds(&source, amount)?;

                ctx.check()?;
                self.store
                    .apply_transfer(from, to, amount)
                    .map_err(|e| mutation_error(e, request.amount))
            }
        }
    }

    fn existing(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.directory
            .get_account(id)?
            .ok_or(LedgerError::no_such_account(id))
    }
}

impl<D, S> Clone for TransactionEngine<D, S> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            store: Arc::clone(&self.store),
            retry: self.retry.clone(),
        }
    }
}

/// Reject zero and negative amounts before any leg-specific logic runs
fn positive_amount(amount: i64) -> Result<u64, LedgerError> {
    u64::try_from(amount)
        .ok()
        .filter(|amount| *amount > 0)
        .ok_or(LedgerError::invalid_amount(amount))
}

/// A credit that would overflow the balance is an unusable amount
fn mutation_error(error: StoreError, amount: i64) -> LedgerError {
    match error {
        StoreError::BalanceOverflow { .. } => LedgerError::invalid_amount(amount),
        other => other.into(),
    }
}

fn ensure_owner(account: &Account, caller: UserId) -> Result<(), LedgerError> {
    if account.is_owned_by(caller) {
        Ok(())
    } else {
        Err(LedgerError::invalid_account(
            account.id,
            AccountRejection::NotOwner,
        ))
    }
}

fn ensure_funds(account: &Account, amount: u64) -> Result<(), LedgerError> {
    if account.balance >= amount {
        Ok(())
    } else {
        Err(LedgerError::not_enough_money(
            account.id,
            account.balance,
            amount,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger_store::InMemoryLedger;
    use crate::types::{CurrencyId, ErrorKind, OperationKind};
    use rstest::rstest;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{Duration, Instant};
    use tokio_util::sync::CancellationToken;

    type Engine = TransactionEngine<InMemoryLedger, InMemoryLedger>;

    struct Bank {
        ledger: Arc<InMemoryLedger>,
        engine: Engine,
        alice: UserId,
        bob: UserId,
        usd: CurrencyId,
        eur: CurrencyId,
    }

    fn bank() -> Bank {
        let ledger = Arc::new(InMemoryLedger::new());
        let alice = ledger.register_user("alice");
        let bob = ledger.register_user("bob");
        let usd = ledger.register_currency("USD");
        let eur = ledger.register_currency("EUR");
        let engine = TransactionEngine::new(Arc::clone(&ledger), Arc::clone(&ledger));
        Bank {
            ledger,
            engine,
            alice,
            bob,
            usd,
            eur,
        }
    }

    impl Bank {
        fn open(&self, owner: UserId, currency: CurrencyId, balance: i64) -> AccountId {
            let id = self.ledger.open_account(owner, currency).unwrap().id;
            if balance > 0 {
                self.engine
                    .process_transaction(owner, &OperationRequest::deposit(id, balance))
                    .unwrap();
            }
            id
        }

        fn balance(&self, id: AccountId) -> u64 {
            self.ledger.get_account(id).unwrap().unwrap().balance
        }

        fn snapshot(&self) -> (Vec<Account>, usize) {
            (
                self.ledger.accounts().unwrap(),
                self.ledger.entry_count().unwrap(),
            )
        }
    }

    #[test]
    fn test_deposit_scenario() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 0);

        let entry = bank
            .engine
            .process_transaction(bank.alice, &OperationRequest::deposit(a1, 100))
            .unwrap();

        assert_eq!(bank.balance(a1), 100);
        assert_eq!(entry.from, None);
        assert_eq!(entry.to, Some(a1));
        assert_eq!(entry.amount, 100);
        assert_eq!(entry.kind(), Some(OperationKind::Deposit));
        assert_eq!(bank.ledger.entry_count().unwrap(), 1);
    }

    #[test]
    fn test_withdraw_insufficient_scenario() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 50);

        let result = bank
            .engine
            .process_transaction(bank.alice, &OperationRequest::withdraw(a1, 100));

        assert_eq!(result, Err(LedgerError::not_enough_money(a1, 50, 100)));
        assert_eq!(bank.balance(a1), 50);
    }

    #[test]
    fn test_withdraw_exact_balance_empties_account() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 50);

        bank.engine
            .process_transaction(bank.alice, &OperationRequest::withdraw(a1, 50))
            .unwrap();

        assert_eq!(bank.balance(a1), 0);
    }

    #[test]
    fn test_transfer_currency_mismatch_scenario() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 100);
        let a2 = bank.open(bank.bob, bank.eur, 0);

        let result = bank
            .engine
            .process_transaction(bank.alice, &OperationRequest::transfer(a1, a2, 50));

        assert_eq!(
            result,
            Err(LedgerError::invalid_account(
                a2,
                AccountRejection::CurrencyMismatch
            ))
        );
        assert_eq!(bank.balance(a1), 100);
        assert_eq!(bank.balance(a2), 0);
    }

    #[test]
    fn test_transfer_conserves_money() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 100);
        let a2 = bank.open(bank.bob, bank.usd, 5);
        let bystander = bank.open(bank.bob, bank.usd, 9);

        let entry = bank
            .engine
            .process_transaction(bank.alice, &OperationRequest::transfer(a1, a2, 30))
            .unwrap();

        assert_eq!(bank.balance(a1), 70);
        assert_eq!(bank.balance(a2), 35);
        assert_eq!(bank.balance(bystander), 9);
        assert_eq!(entry.from, Some(a1));
        assert_eq!(entry.to, Some(a2));
        assert_eq!(entry.currency, bank.usd);
    }

    #[rstest]
    fn test_non_positive_amounts_rejected_for_every_kind(
        #[values(0, -5, i64::MIN)] amount: i64,
        #[values(OperationKind::Deposit, OperationKind::Withdraw, OperationKind::Transfer)]
        kind: OperationKind,
    ) {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 100);
        let a2 = bank.open(bank.alice, bank.usd, 100);
        let request = match kind {
            OperationKind::Deposit => OperationRequest::deposit(a1, amount),
            OperationKind::Withdraw => OperationRequest::withdraw(a1, amount),
            OperationKind::Transfer => OperationRequest::transfer(a1, a2, amount),
        };
        let before = bank.snapshot();

        let result = bank.engine.process_transaction(bank.alice, &request);

        assert_eq!(result, Err(LedgerError::invalid_amount(amount)));
        assert_eq!(bank.snapshot(), before);
    }

    #[test]
    fn test_amount_checked_before_account_existence() {
        let bank = bank();

        let result = bank
            .engine
            .process_transaction(bank.alice, &OperationRequest::deposit(999, 0));

        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidAmount);
    }

    #[rstest]
    #[case::deposit(OperationRequest::deposit(999, 10), 999)]
    #[case::withdraw(OperationRequest::withdraw(999, 10), 999)]
    #[case::transfer_missing_source(OperationRequest::transfer(999, 1, 10), 999)]
    #[case::transfer_missing_destination(OperationRequest::transfer(1, 999, 10), 999)]
    fn test_missing_accounts(#[case] request: OperationRequest, #[case] missing: AccountId) {
        let bank = bank();
        bank.open(bank.alice, bank.usd, 100);
        let before = bank.snapshot();

        let result = bank.engine.process_transaction(bank.alice, &request);

        assert_eq!(result, Err(LedgerError::no_such_account(missing)));
        assert_eq!(bank.snapshot(), before);
    }

    #[test]
    fn test_missing_destination_reported_before_foreign_source() {
        let bank = bank();
        let bobs = bank.open(bank.bob, bank.usd, 100);

        let result = bank
            .engine
            .process_transaction(bank.alice, &OperationRequest::transfer(bobs, 999, 10));

        assert_eq!(result, Err(LedgerError::no_such_account(999)));
    }

    #[rstest]
    #[case::deposit(OperationKind::Deposit)]
    #[case::withdraw(OperationKind::Withdraw)]
    #[case::transfer(OperationKind::Transfer)]
    fn test_foreign_account_rejected(#[case] kind: OperationKind) {
        let bank = bank();
        let bobs = bank.open(bank.bob, bank.usd, 100);
        let alices = bank.open(bank.alice, bank.usd, 100);
        let request = match kind {
            OperationKind::Deposit => OperationRequest::deposit(bobs, 10),
            OperationKind::Withdraw => OperationRequest::withdraw(bobs, 10),
            OperationKind::Transfer => OperationRequest::transfer(bobs, alices, 10),
        };
        let before = bank.snapshot();

        let result = bank.engine.process_transaction(bank.alice, &request);

        assert_eq!(
            result,
            Err(LedgerError::invalid_account(bobs, AccountRejection::NotOwner))
        );
        assert_eq!(bank.snapshot(), before);
    }

    #[test]
    fn test_transfer_to_foreign_account_allowed() {
        let bank = bank();
        let alices = bank.open(bank.alice, bank.usd, 100);
        let bobs = bank.open(bank.bob, bank.usd, 0);

        bank.engine
            .process_transaction(bank.alice, &OperationRequest::transfer(alices, bobs, 60))
            .unwrap();

        assert_eq!(bank.balance(alices), 40);
        assert_eq!(bank.balance(bobs), 60);
    }

    #[test]
    fn test_ownership_checked_before_funds() {
        let bank = bank();
        let bobs = bank.open(bank.bob, bank.usd, 0);

        let result = bank
            .engine
            .process_transaction(bank.alice, &OperationRequest::withdraw(bobs, 10));

        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidAccount);
    }

    #[test]
    fn test_currency_checked_before_funds() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 0);
        let a2 = bank.open(bank.alice, bank.eur, 0);

        let result = bank
            .engine
            .process_transaction(bank.alice, &OperationRequest::transfer(a1, a2, 10));

        assert_eq!(
            result,
            Err(LedgerError::invalid_account(
                a2,
                AccountRejection::CurrencyMismatch
            ))
        );
    }

    #[test]
    fn test_transfer_insufficient_funds() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 20);
        let a2 = bank.open(bank.bob, bank.usd, 0);

        let result = bank
            .engine
            .process_transaction(bank.alice, &OperationRequest::transfer(a1, a2, 21));

        assert_eq!(result, Err(LedgerError::not_enough_money(a1, 20, 21)));
        assert_eq!(bank.balance(a1), 20);
        assert_eq!(bank.balance(a2), 0);
    }

    #[test]
    fn test_self_transfer_rejected() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 20);

        let result = bank
            .engine
            .process_transaction(bank.alice, &OperationRequest::transfer(a1, a1, 5));

        assert_eq!(
            result,
            Err(LedgerError::invalid_account(a1, AccountRejection::SameAccount))
        );
        assert_eq!(bank.balance(a1), 20);
    }

    #[test]
    fn test_closed_account_rejected() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 20);
        bank.ledger.close_account(a1).unwrap();

        let result = bank
            .engine
            .process_transaction(bank.alice, &OperationRequest::deposit(a1, 5));

        assert_eq!(result, Err(LedgerError::no_such_account(a1)));
    }

    #[test]
    fn test_deposit_overflow_rejected_as_invalid_amount() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, i64::MAX);
        bank.engine
            .process_transaction(bank.alice, &OperationRequest::deposit(a1, i64::MAX))
            .unwrap();
        let before = bank.snapshot();

        let result = bank
            .engine
            .process_transaction(bank.alice, &OperationRequest::deposit(a1, 2));

        assert_eq!(result, Err(LedgerError::invalid_amount(2)));
        assert_eq!(bank.snapshot(), before);
    }

    #[test]
    fn test_duplicate_submission_applies_twice() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 0);
        let request = OperationRequest::deposit(a1, 10);

        let first = bank.engine.process_transaction(bank.alice, &request).unwrap();
        let second = bank.engine.process_transaction(bank.alice, &request).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(bank.balance(a1), 20);
    }

    #[test]
    fn test_cancelled_request_has_no_effect() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 10);
        let token = CancellationToken::new();
        let ctx = RequestContext::background().cancelled_by(token.clone());
        token.cancel();
        let before = bank.snapshot();

        let result = bank
            .engine
            .process_transaction_in(&ctx, bank.alice, &OperationRequest::withdraw(a1, 5));

        assert_eq!(result, Err(LedgerError::Cancelled));
        assert_eq!(bank.snapshot(), before);
    }

    #[test]
    fn test_expired_request_has_no_effect() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 10);
        let ctx = RequestContext::background().deadline(Instant::now());
        let before = bank.snapshot();

        let result = bank
            .engine
            .process_transaction_in(&ctx, bank.alice, &OperationRequest::deposit(a1, 5));

        assert_eq!(result, Err(LedgerError::DeadlineExceeded));
        assert_eq!(bank.snapshot(), before);
    }

    /// Delegating store that reports a conflict for the first `conflicts` mutations
    struct ContendedStore {
        inner: Arc<InMemoryLedger>,
        conflicts: AtomicU32,
        calls: AtomicU32,
    }

    impl ContendedStore {
        fn new(inner: Arc<InMemoryLedger>, conflicts: u32) -> Self {
            Self {
                inner,
                conflicts: AtomicU32::new(conflicts),
                calls: AtomicU32::new(0),
            }
        }

        fn contend(&self, account: AccountId) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self
                .conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            match left {
                Ok(_) => Err(StoreError::Conflict { account }),
                Err(_) => Ok(()),
            }
        }
    }

    impl LedgerStore for ContendedStore {
        fn apply_single_leg(
            &self,
            account: AccountId,
            amount: u64,
            direction: Direction,
        ) -> Result<LedgerEntry, StoreError> {
            self.contend(account)?;
            self.inner.apply_single_leg(account, amount, direction)
        }

        fn apply_transfer(
            &self,
            from: AccountId,
            to: AccountId,
            amount: u64,
        ) -> Result<LedgerEntry, StoreError> {
            self.contend(from)?;
            self.inner.apply_transfer(from, to, amount)
        }

        fn list_entries(&self, accounts: &[AccountId]) -> Result<Vec<LedgerEntry>, StoreError> {
            self.inner.list_entries(accounts)
        }
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            max_attempts,
            Duration::from_millis(1),
            Duration::from_millis(2),
        )
    }

    #[test]
    fn test_conflict_retried_until_success() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 50);
        let store = Arc::new(ContendedStore::new(Arc::clone(&bank.ledger), 2));
        let engine = TransactionEngine::new(Arc::clone(&bank.ledger), Arc::clone(&store))
            .with_retry_policy(fast_retry(3));

        engine
            .process_transaction(bank.alice, &OperationRequest::withdraw(a1, 20))
            .unwrap();

        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
        assert_eq!(bank.balance(a1), 30);
    }

    #[test]
    fn test_conflict_surfaces_after_retries_exhausted() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 50);
        let a2 = bank.open(bank.bob, bank.usd, 0);
        let store = Arc::new(ContendedStore::new(Arc::clone(&bank.ledger), 10));
        let engine = TransactionEngine::new(Arc::clone(&bank.ledger), Arc::clone(&store))
            .with_retry_policy(fast_retry(3));
        let before = bank.snapshot();

        let result =
            engine.process_transaction(bank.alice, &OperationRequest::transfer(a1, a2, 20));

        assert_eq!(result, Err(LedgerError::Conflict { attempts: 3 }));
        assert!(result.unwrap_err().is_retryable());
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
        assert_eq!(bank.snapshot(), before);
    }

    #[test]
    fn test_retry_stops_at_deadline() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 50);
        let store = Arc::new(ContendedStore::new(Arc::clone(&bank.ledger), 100));
        let engine = TransactionEngine::new(Arc::clone(&bank.ledger), Arc::clone(&store))
            .with_retry_policy(RetryPolicy::new(
                100,
                Duration::from_millis(50),
                Duration::from_millis(50),
            ));
        let ctx = RequestContext::with_timeout(Duration::from_millis(20));

        let result =
            engine.process_transaction_in(&ctx, bank.alice, &OperationRequest::withdraw(a1, 5));

        assert_eq!(result, Err(LedgerError::DeadlineExceeded));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(bank.balance(a1), 50);
    }

    /// Store whose mutations always fail
    struct BrokenStore;

    impl LedgerStore for BrokenStore {
        fn apply_single_leg(
            &self,
            _account: AccountId,
            _amount: u64,
            _direction: Direction,
        ) -> Result<LedgerEntry, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        fn apply_transfer(
            &self,
            _from: AccountId,
            _to: AccountId,
            _amount: u64,
        ) -> Result<LedgerEntry, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        fn list_entries(&self, _accounts: &[AccountId]) -> Result<Vec<LedgerEntry>, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }
    }

    #[test]
    fn test_store_failure_is_not_retried() {
        let bank = bank();
        let a1 = bank.open(bank.alice, bank.usd, 50);
        let engine = TransactionEngine::new(Arc::clone(&bank.ledger), Arc::new(BrokenStore));

        let result = engine.process_transaction(bank.alice, &OperationRequest::withdraw(a1, 5));

        assert_eq!(
            result,
            Err(LedgerError::store("Store unavailable: connection refused"))
        );
        assert_eq!(bank.balance(a1), 50);
    }
}
