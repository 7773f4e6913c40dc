//! Ledger Store - in-memory account balances.
//!
//! The ledger is the only mutable shared resource in the pipeline. All
//! balance mutations go through [`Ledger::settle`], which holds the mutex
//! for the whole lookup / funds-check / debit+credit sequence so that
//! concurrent transfers against the same account can never interleave a
//! read-balance/write-balance race. The lock is never held across I/O;
//! persistence and notification happen after [`Ledger::settle`] returns.

use std::sync::Mutex;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use crate::core_types::{AccountRef, OwnerId, RecipientRef};

/// A ledger account. Created at registration time (external collaborator);
/// seeded from config in this process.
#[derive(Debug, Clone)]
pub struct Account {
    pub account: AccountRef,
    pub owner: OwnerId,
    pub display_name: String,
    pub balance: Decimal,
    pub currency: String,
}

/// Read-only view of a recipient resolved against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecipient {
    pub account: AccountRef,
    pub owner: OwnerId,
    pub display_name: String,
}

/// One side of a settled transfer, captured while the lock was held.
#[derive(Debug, Clone)]
pub struct SettledParty {
    pub owner: OwnerId,
    pub display_name: String,
    pub balance_after: Decimal,
}

/// Outcome of a successful debit+credit pair.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub sender: SettledParty,
    pub recipient: SettledParty,
}

/// Settlement failures. Messages are the user-visible failure reasons
/// recorded on the transfer; the ledger is untouched when any of these
/// is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("sender not found")]
    SenderNotFound,

    #[error("recipient not found")]
    RecipientNotFound,

    #[error("insufficient balance")]
    InsufficientBalance,
}

struct LedgerInner {
    accounts: FxHashMap<AccountRef, Account>,
    /// Owner alias -> account-pair index (one account per owner).
    owners: FxHashMap<OwnerId, AccountRef>,
}

/// In-memory map of account -> balance + metadata.
///
/// Owned by the process; handed to the Settlement Worker by `Arc`. Everyone
/// else gets read-only snapshots via [`Ledger::resolve_recipient`] and
/// [`Ledger::balance_of`].
pub struct Ledger {
    inner: Mutex<LedgerInner>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LedgerInner {
                accounts: FxHashMap::default(),
                owners: FxHashMap::default(),
            }),
        }
    }

    /// Register an account. Last write wins on duplicate account-pairs.
    pub fn register(&self, account: Account) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .owners
            .insert(account.owner.clone(), account.account.clone());
        debug!(owner = %account.owner, account = %account.account, "Account registered");
        inner.accounts.insert(account.account.clone(), account);
    }

    /// Resolve a recipient reference to a concrete account.
    ///
    /// Used by intake for the cheap fail-fast check; the worker re-resolves
    /// authoritatively inside the critical section.
    pub fn resolve_recipient(&self, recipient: &RecipientRef) -> Option<ResolvedRecipient> {
        let inner = self.inner.lock().unwrap();
        inner.resolve(recipient).map(|acct| ResolvedRecipient {
            account: acct.account.clone(),
            owner: acct.owner.clone(),
            display_name: acct.display_name.clone(),
        })
    }

    /// Current balance for an owner, if the owner has an account.
    pub fn balance_of(&self, owner: &str) -> Option<Decimal> {
        let inner = self.inner.lock().unwrap();
        let key = inner.owners.get(owner)?;
        inner.accounts.get(key).map(|acct| acct.balance)
    }

    /// Apply a transfer's balance mutation under mutual exclusion.
    ///
    /// The critical section spans both lookups, the funds check, and both
    /// mutations. On any error the ledger is left untouched; a debit can
    /// never drive a balance negative.
    pub fn settle(
        &self,
        sender_owner: &str,
        recipient: &RecipientRef,
        amount: Decimal,
    ) -> Result<Settlement, LedgerError> {
        let mut inner = self.inner.lock().unwrap();

        let sender_key = inner
            .owners
            .get(sender_owner)
            .cloned()
            .ok_or(LedgerError::SenderNotFound)?;
        let recipient_key = inner
            .resolve(recipient)
            .map(|acct| acct.account.clone())
            .ok_or(LedgerError::RecipientNotFound)?;

        let sender_balance = inner
            .accounts
            .get(&sender_key)
            .map(|acct| acct.balance)
            .ok_or(LedgerError::SenderNotFound)?;
        if sender_balance < amount {
            return Err(LedgerError::InsufficientBalance);
        }

        // Funds verified; both mutations happen before the lock is released.
        let sender = {
            let acct = inner
                .accounts
                .get_mut(&sender_key)
                .ok_or(LedgerError::SenderNotFound)?;
            acct.balance -= amount;
            SettledParty {
                owner: acct.owner.clone(),
                display_name: acct.display_name.clone(),
                balance_after: acct.balance,
            }
        };
        let recipient = {
            let acct = inner
                .accounts
                .get_mut(&recipient_key)
                .ok_or(LedgerError::RecipientNotFound)?;
            acct.balance += amount;
            SettledParty {
                owner: acct.owner.clone(),
                display_name: acct.display_name.clone(),
                balance_after: acct.balance,
            }
        };

        Ok(Settlement { sender, recipient })
    }
}

impl LedgerInner {
    fn resolve(&self, recipient: &RecipientRef) -> Option<&Account> {
        match recipient {
            RecipientRef::Account(acct) => self.accounts.get(acct),
            RecipientRef::Owner(owner) => {
                let key = self.owners.get(owner)?;
                self.accounts.get(key)
            }
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn dec(v: i64) -> Decimal {
        Decimal::from_i64(v).unwrap()
    }

    fn test_ledger() -> Ledger {
        let ledger = Ledger::new();
        ledger.register(Account {
            account: AccountRef::new("001", "1000-1"),
            owner: "alice@example.com".into(),
            display_name: "Alice".into(),
            balance: dec(1000),
            currency: "BRL".into(),
        });
        ledger.register(Account {
            account: AccountRef::new("001", "2000-2"),
            owner: "bob@example.com".into(),
            display_name: "Bob".into(),
            balance: dec(50),
            currency: "BRL".into(),
        });
        ledger
    }

    #[test]
    fn test_resolve_by_owner_and_account() {
        let ledger = test_ledger();

        let by_owner = ledger
            .resolve_recipient(&RecipientRef::Owner("bob@example.com".into()))
            .unwrap();
        assert_eq!(by_owner.display_name, "Bob");

        let by_account = ledger
            .resolve_recipient(&RecipientRef::Account(AccountRef::new("001", "2000-2")))
            .unwrap();
        assert_eq!(by_account.owner, "bob@example.com");

        assert!(
            ledger
                .resolve_recipient(&RecipientRef::Owner("nobody@example.com".into()))
                .is_none()
        );
    }

    #[test]
    fn test_settle_moves_funds() {
        let ledger = test_ledger();
        let settlement = ledger
            .settle(
                "alice@example.com",
                &RecipientRef::Owner("bob@example.com".into()),
                dec(100),
            )
            .unwrap();

        assert_eq!(settlement.sender.balance_after, dec(900));
        assert_eq!(settlement.recipient.balance_after, dec(150));
        assert_eq!(ledger.balance_of("alice@example.com"), Some(dec(900)));
        assert_eq!(ledger.balance_of("bob@example.com"), Some(dec(150)));
    }

    #[test]
    fn test_settle_insufficient_balance_leaves_ledger_untouched() {
        let ledger = test_ledger();
        let err = ledger
            .settle(
                "bob@example.com",
                &RecipientRef::Owner("alice@example.com".into()),
                dec(100),
            )
            .unwrap_err();

        assert_eq!(err, LedgerError::InsufficientBalance);
        assert_eq!(err.to_string(), "insufficient balance");
        assert_eq!(ledger.balance_of("bob@example.com"), Some(dec(50)));
        assert_eq!(ledger.balance_of("alice@example.com"), Some(dec(1000)));
    }

    #[test]
    fn test_settle_unknown_parties() {
        let ledger = test_ledger();

        let err = ledger
            .settle(
                "nobody@example.com",
                &RecipientRef::Owner("bob@example.com".into()),
                dec(10),
            )
            .unwrap_err();
        assert_eq!(err, LedgerError::SenderNotFound);

        let err = ledger
            .settle(
                "alice@example.com",
                &RecipientRef::Account(AccountRef::new("999", "0-0")),
                dec(10),
            )
            .unwrap_err();
        assert_eq!(err, LedgerError::RecipientNotFound);
        assert_eq!(ledger.balance_of("alice@example.com"), Some(dec(1000)));
    }

    #[test]
    fn test_exact_balance_is_spendable() {
        let ledger = test_ledger();
        let settlement = ledger
            .settle(
                "bob@example.com",
                &RecipientRef::Owner("alice@example.com".into()),
                dec(50),
            )
            .unwrap();
        assert_eq!(settlement.sender.balance_after, dec(0));
    }

    #[test]
    fn test_concurrent_settles_never_overdraft() {
        use std::sync::Arc;
        use std::thread;

        let ledger = Arc::new(test_ledger());
        let mut handles = vec![];
        for _ in 0..8 {
            let ledger = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                ledger
                    .settle(
                        "alice@example.com",
                        &RecipientRef::Owner("bob@example.com".into()),
                        dec(300),
                    )
                    .is_ok()
            }));
        }

        let completed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        // 1000 / 300: exactly three transfers fit, the rest must fail.
        assert_eq!(completed, 3);
        assert_eq!(ledger.balance_of("alice@example.com"), Some(dec(100)));
        assert_eq!(ledger.balance_of("bob@example.com"), Some(dec(950)));
    }
}
