//! External collaborators of the sale engine
//!
//! The engine only decides whether a unit may be sold, at which price and in
//! which period. Authorization, payment and issuance live behind these
//! traits so a runtime can plug in its own ledger and minter.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::PaymentError;
use crate::events::{NoopListener, SaleListener};
use crate::{Amount, PeriodIndex, UnitId};

/// Binary admin-or-not check
pub trait AdminAuthority: Send + Sync {
    fn is_admin(&self, caller: &str) -> bool;
}

/// Debit-on-demand payment ledger
pub trait PaymentLedger: Send + Sync {
    /// Take `amount` from `caller`. Must have no effect when it fails.
    fn debit(&self, caller: &str, amount: Amount) -> Result<(), PaymentError>;
}

/// Issues the sold unit once payment has been taken
pub trait UnitIssuer: Send + Sync {
    fn issue(&self, buyer: &str, period_index: PeriodIndex, price: Amount) -> UnitId;
}

/// Fixed set of admin accounts
#[derive(Debug, Clone, Default)]
pub struct AdminSet {
    admins: HashSet<String>,
}

impl AdminSet {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.admins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

impl AdminAuthority for AdminSet {
    fn is_admin(&self, caller: &str) -> bool {
        self.admins.contains(caller)
    }
}

/// Balance-backed ledger kept in memory
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: Mutex<BTreeMap<String, Amount>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_balances(balances: BTreeMap<String, Amount>) -> Self {
        Self {
            balances: Mutex::new(balances),
        }
    }

    /// Add funds to an account, creating it if needed
    pub fn credit(&self, account: &str, amount: Amount) -> Amount {
        let mut balances = self.balances.lock();
        let balance = balances.entry(account.to_string()).or_insert(0);
        *balance = balance.saturating_add(amount);
        *balance
    }

    pub fn balance_of(&self, account: &str) -> Amount {
        self.balances.lock().get(account).copied().unwrap_or(0)
    }

    /// Copy of every balance, for persistence
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            balances: self.balances.lock().clone(),
        }
    }
}

impl From<LedgerSnapshot> for InMemoryLedger {
    fn from(snapshot: LedgerSnapshot) -> Self {
        Self::from_balances(snapshot.balances)
    }
}

impl PaymentLedger for InMemoryLedger {
    fn debit(&self, caller: &str, amount: Amount) -> Result<(), PaymentError> {
        let mut balances = self.balances.lock();
        let balance = balances
            .get_mut(caller)
            .ok_or_else(|| PaymentError::UnknownAccount(caller.to_string()))?;

        if *balance < amount {
            return Err(PaymentError::InsufficientBalance {
                requested: amount,
                available: *balance,
            });
        }

        *balance -= amount;
        Ok(())
    }
}

/// Serializable ledger balances
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LedgerSnapshot {
    pub balances: BTreeMap<String, Amount>,
}

/// Hands out consecutive unit ids
#[derive(Debug, Default)]
pub struct SequentialIssuer {
    next_id: AtomicU64,
}

impl SequentialIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue numbering after `next_id - 1` units
    pub fn starting_at(next_id: UnitId) -> Self {
        Self {
            next_id: AtomicU64::new(next_id),
        }
    }

    pub fn next_id(&self) -> UnitId {
        self.next_id.load(Ordering::SeqCst)
    }
}

impl UnitIssuer for SequentialIssuer {
    fn issue(&self, _buyer: &str, _period_index: PeriodIndex, _price: Amount) -> UnitId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

/// Everything the engine talks to outside its own state
#[derive(Clone)]
pub struct Collaborators {
    pub admins: Arc<dyn AdminAuthority>,
    pub ledger: Arc<dyn PaymentLedger>,
    pub issuer: Arc<dyn UnitIssuer>,
    pub listener: Arc<dyn SaleListener>,
}

impl Collaborators {
    pub fn new(
        admins: Arc<dyn AdminAuthority>,
        ledger: Arc<dyn PaymentLedger>,
        issuer: Arc<dyn UnitIssuer>,
    ) -> Self {
        Self {
            admins,
            ledger,
            issuer,
            listener: Arc::new(NoopListener),
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn SaleListener>) -> Self {
        self.listener = listener;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_set() {
        let admins = AdminSet::new(["admin"]);
        assert!(admins.is_admin("admin"));
        assert!(!admins.is_admin("user"));
        assert_eq!(admins.len(), 1);
    }

    #[test]
    fn test_ledger_debit() {
        let ledger = InMemoryLedger::new();
        ledger.credit("alice", 100);

        assert!(ledger.debit("alice", 60).is_ok());
        assert_eq!(ledger.balance_of("alice"), 40);

        let result = ledger.debit("alice", 41);
        assert_eq!(
            result,
            Err(PaymentError::InsufficientBalance {
                requested: 41,
                available: 40
            })
        );
        assert_eq!(ledger.balance_of("alice"), 40);
    }

    #[test]
    fn test_ledger_unknown_account() {
        let ledger = InMemoryLedger::new();
        assert_eq!(
            ledger.debit("ghost", 1),
            Err(PaymentError::UnknownAccount("ghost".to_string()))
        );
    }

    #[test]
    fn test_ledger_snapshot_restore() {
        let ledger = InMemoryLedger::new();
        ledger.credit("alice", 5);
        ledger.credit("bob", 7);

        let restored = InMemoryLedger::from(ledger.snapshot());
        assert_eq!(restored.balance_of("alice"), 5);
        assert_eq!(restored.balance_of("bob"), 7);
    }

    #[test]
    fn test_sequential_issuer() {
        let issuer = SequentialIssuer::starting_at(30);
        assert_eq!(issuer.issue("alice", 0, 1), 30);
        assert_eq!(issuer.issue("bob", 1, 1), 31);
        assert_eq!(issuer.next_id(), 32);
    }
}
