use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::debug;

use bankd_core::{AccountName, Amount, BankError, BankResult};

/// A named balance record.
///
/// `in_session` is true iff exactly one live session currently serves the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    name: AccountName,
    balance: Amount,
    in_session: bool,
}

impl Account {
    fn open(name: AccountName) -> Self {
        Self {
            name,
            balance: Amount::ZERO,
            in_session: false,
        }
    }

    pub fn name(&self) -> &AccountName {
        &self.name
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn in_session(&self) -> bool {
        self.in_session
    }
}

/// Read-only view of one account, as produced by [`Ledger::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSnapshot {
    pub name: AccountName,
    pub balance: Amount,
    pub in_session: bool,
}

impl From<&Account> for AccountSnapshot {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            balance: account.balance,
            in_session: account.in_session,
        }
    }
}

/// Accounts in creation order plus a name index.
///
/// Accounts are never removed, so indices stay valid for the life of the ledger.
#[derive(Debug, Default)]
struct Accounts {
    entries: Vec<Account>,
    by_name: HashMap<AccountName, usize>,
}

impl Accounts {
    fn get_mut(&mut self, name: &AccountName) -> Option<&mut Account> {
        let idx = *self.by_name.get(name)?;
        self.entries.get_mut(idx)
    }

    fn get(&self, name: &AccountName) -> Option<&Account> {
        let idx = *self.by_name.get(name)?;
        self.entries.get(idx)
    }
}

/// The shared ledger service.
///
/// Owned by the process and handed to every worker behind an `Arc`. Each
/// operation holds the lock for its full duration and performs no IO while
/// holding it.
///
/// Accounts have no delete operation. Once `begin_session` has succeeded for a
/// name, later lookups for that name cannot miss; the `NotFound` arms of
/// `deposit`/`withdraw`/`query` exist only to keep the API total.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: Mutex<Accounts>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Accounts> {
        // Every operation validates before mutating, so a panic elsewhere can
        // never leave the map half-updated.
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new account with a zero balance.
    pub fn create(&self, name: &AccountName) -> BankResult<()> {
        let mut accounts = self.lock();
        if accounts.by_name.contains_key(name) {
            return Err(BankError::already_exists(name));
        }

        let idx = accounts.entries.len();
        accounts.entries.push(Account::open(name.clone()));
        accounts.by_name.insert(name.clone(), idx);
        debug!(account = %name, "account created");
        Ok(())
    }

    /// Claim exclusive service access to an account.
    pub fn begin_session(&self, name: &AccountName) -> BankResult<()> {
        let mut accounts = self.lock();
        let account = accounts
            .get_mut(name)
            .ok_or_else(|| BankError::not_found(name))?;
        if account.in_session {
            return Err(BankError::already_in_use(name));
        }
        account.in_session = true;
        Ok(())
    }

    /// Release service access. Idempotent; an unknown name is a no-op.
    pub fn end_session(&self, name: &AccountName) {
        if let Some(account) = self.lock().get_mut(name) {
            account.in_session = false;
        }
    }

    /// Add `amount` (validated positive by the caller) and return the new balance.
    pub fn deposit(&self, name: &AccountName, amount: Amount) -> BankResult<Amount> {
        let mut accounts = self.lock();
        let account = accounts
            .get_mut(name)
            .ok_or_else(|| BankError::not_found(name))?;
        let balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| BankError::validation("deposit would exceed the balance limit"))?;
        account.balance = balance;
        Ok(balance)
    }

    /// Subtract `amount` (validated positive by the caller) and return the new
    /// balance. The balance never goes negative.
    pub fn withdraw(&self, name: &AccountName, amount: Amount) -> BankResult<Amount> {
        let mut accounts = self.lock();
        let account = accounts
            .get_mut(name)
            .ok_or_else(|| BankError::not_found(name))?;
        if amount > account.balance {
            return Err(BankError::Insufficient {
                balance: account.balance,
            });
        }
        account.balance = account
            .balance
            .checked_sub(amount)
            .ok_or_else(|| BankError::validation("withdrawal out of range"))?;
        Ok(account.balance)
    }

    pub fn query(&self, name: &AccountName) -> BankResult<Amount> {
        self.lock()
            .get(name)
            .map(Account::balance)
            .ok_or_else(|| BankError::not_found(name))
    }

    /// Whether the account is currently being served by some connection.
    pub fn in_session(&self, name: &AccountName) -> BankResult<bool> {
        self.lock()
            .get(name)
            .map(Account::in_session)
            .ok_or_else(|| BankError::not_found(name))
    }

    /// Consistent copy of every account in creation order.
    pub fn snapshot(&self) -> Vec<AccountSnapshot> {
        self.lock().entries.iter().map(AccountSnapshot::from).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    fn amount(s: &str) -> Amount {
        s.parse().unwrap()
    }

    #[test]
    fn create_starts_at_zero_outside_a_session() {
        let ledger = Ledger::new();
        ledger.create(&name("alice")).unwrap();

        assert_eq!(ledger.query(&name("alice")).unwrap(), Amount::ZERO);
        assert!(!ledger.in_session(&name("alice")).unwrap());
    }

    #[test]
    fn duplicate_create_never_overwrites() {
        let ledger = Ledger::new();
        let alice = name("alice");
        ledger.create(&alice).unwrap();
        ledger.deposit(&alice, amount("10")).unwrap();

        let err = ledger.create(&alice).unwrap_err();
        assert_eq!(err, BankError::already_exists(&alice));
        assert_eq!(ledger.query(&alice).unwrap(), amount("10"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn begin_session_is_exclusive() {
        let ledger = Ledger::new();
        let alice = name("alice");
        ledger.create(&alice).unwrap();

        ledger.begin_session(&alice).unwrap();
        assert_eq!(
            ledger.begin_session(&alice).unwrap_err(),
            BankError::already_in_use(&alice)
        );

        ledger.end_session(&alice);
        ledger.begin_session(&alice).unwrap();
    }

    #[test]
    fn begin_session_on_unknown_account_fails() {
        let ledger = Ledger::new();
        let ghost = name("ghost");
        assert_eq!(
            ledger.begin_session(&ghost).unwrap_err(),
            BankError::not_found(&ghost)
        );
    }

    #[test]
    fn end_session_is_idempotent_and_tolerates_missing_accounts() {
        let ledger = Ledger::new();
        let alice = name("alice");
        ledger.create(&alice).unwrap();

        ledger.end_session(&alice);
        ledger.end_session(&alice);
        ledger.end_session(&name("ghost"));
        assert!(!ledger.in_session(&alice).unwrap());
    }

    #[test]
    fn insufficient_withdrawal_leaves_balance_untouched() {
        let ledger = Ledger::new();
        let alice = name("alice");
        ledger.create(&alice).unwrap();
        ledger.deposit(&alice, amount("100")).unwrap();

        let err = ledger.withdraw(&alice, amount("150")).unwrap_err();
        assert_eq!(
            err,
            BankError::Insufficient {
                balance: amount("100")
            }
        );
        assert_eq!(ledger.withdraw(&alice, amount("50")).unwrap(), amount("50"));
        assert_eq!(ledger.query(&alice).unwrap(), amount("50"));
    }

    #[test]
    fn deposit_overflow_is_rejected() {
        let ledger = Ledger::new();
        let alice = name("alice");
        ledger.create(&alice).unwrap();
        ledger
            .deposit(&alice, Amount::from_micros(i64::MAX - 1))
            .unwrap();

        assert!(matches!(
            ledger.deposit(&alice, Amount::from_micros(2)),
            Err(BankError::Validation(_))
        ));
        assert_eq!(
            ledger.query(&alice).unwrap(),
            Amount::from_micros(i64::MAX - 1)
        );
    }

    #[test]
    fn snapshot_preserves_creation_order() {
        let ledger = Ledger::new();
        for n in ["carol", "alice", "bob"] {
            ledger.create(&name(n)).unwrap();
        }
        ledger.begin_session(&name("alice")).unwrap();

        let snap = ledger.snapshot();
        let names: Vec<_> = snap.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["carol", "alice", "bob"]);
        assert!(snap[1].in_session);
        assert!(!snap[0].in_session);
    }

    #[test]
    fn concurrent_serve_has_exactly_one_winner() {
        let ledger = Arc::new(Ledger::new());
        let alice = name("alice");
        ledger.create(&alice).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ledger = ledger.clone();
                let alice = alice.clone();
                thread::spawn(move || ledger.begin_session(&alice))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| *e == BankError::already_in_use(&alice)));
    }

    #[test]
    fn concurrent_deposits_are_not_lost() {
        let ledger = Arc::new(Ledger::new());
        let alice = name("alice");
        ledger.create(&alice).unwrap();

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..100 {
                        ledger.deposit(&alice, amount("1")).unwrap();
                    }
                });
            }
        });

        assert_eq!(ledger.query(&alice).unwrap(), amount("800"));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: create succeeds exactly once per distinct name.
        #[test]
        fn create_is_unique_per_name(names in prop::collection::vec("[a-z]{1,4}", 1..32)) {
            let ledger = Ledger::new();
            let mut seen = HashSet::new();

            for raw in &names {
                let n = name(raw);
                let first = seen.insert(raw.clone());
                match ledger.create(&n) {
                    Ok(()) => prop_assert!(first),
                    Err(e) => {
                        prop_assert!(!first);
                        prop_assert_eq!(e, BankError::already_exists(&n));
                    }
                }
            }

            prop_assert_eq!(ledger.len(), seen.len());
        }

        /// Property: deposit(x) then withdraw(x) leaves the balance unchanged.
        #[test]
        fn deposit_then_withdraw_is_balance_idempotent(
            start in 0i64..1_000_000_000_000,
            x in 1i64..1_000_000_000_000,
        ) {
            let ledger = Ledger::new();
            let alice = name("alice");
            ledger.create(&alice).unwrap();
            if start > 0 {
                ledger.deposit(&alice, Amount::from_micros(start)).unwrap();
            }

            ledger.deposit(&alice, Amount::from_micros(x)).unwrap();
            ledger.withdraw(&alice, Amount::from_micros(x)).unwrap();

            prop_assert_eq!(ledger.query(&alice).unwrap(), Amount::from_micros(start));
        }

        /// Property: no sequence of withdrawals drives a balance negative.
        #[test]
        fn withdrawals_never_go_negative(
            deposits in prop::collection::vec(1i64..10_000, 0..8),
            withdrawals in prop::collection::vec(1i64..20_000, 1..16),
        ) {
            let ledger = Ledger::new();
            let alice = name("alice");
            ledger.create(&alice).unwrap();
            for d in deposits {
                ledger.deposit(&alice, Amount::from_micros(d)).unwrap();
            }

            for w in withdrawals {
                let before = ledger.query(&alice).unwrap();
                match ledger.withdraw(&alice, Amount::from_micros(w)) {
                    Ok(after) => prop_assert_eq!(after.micros(), before.micros() - w),
                    Err(e) => {
                        prop_assert!(w > before.micros());
                        prop_assert_eq!(e, BankError::Insufficient { balance: before });
                        prop_assert_eq!(ledger.query(&alice).unwrap(), before);
                    }
                }
                prop_assert!(!ledger.query(&alice).unwrap().is_negative());
            }
        }
    }
}
