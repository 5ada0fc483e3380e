//! Ledger store: per-principal balances
//!
//! Two independent books keyed by principal:
//! - sender side: funds available to escrow
//! - recipient side: funds settled after confirmation
//!
//! Lookups are total (unknown principals read as 0).

use crate::types::Principal;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Balance books
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceStore {
    sender: HashMap<Principal, u64>,
    recipient: HashMap<Principal, u64>,
}

impl BalanceStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit sender-side balance from an external deposit
    pub fn deposit(&mut self, principal: &Principal, amount: u64) -> Result<u64> {
        if amount == 0 {
            return Err(Error::InvalidAmount("deposit must be positive".to_string()));
        }
        self.credit_sender(principal, amount)
    }

    /// Sender-side balance
    pub fn sender_balance(&self, principal: &Principal) -> u64 {
        self.sender.get(principal).copied().unwrap_or(0)
    }

    /// Recipient-side balance
    pub fn recipient_balance(&self, principal: &Principal) -> u64 {
        self.recipient.get(principal).copied().unwrap_or(0)
    }

    /// Add to sender-side balance, returning the new balance
    pub fn credit_sender(&mut self, principal: &Principal, amount: u64) -> Result<u64> {
        credit(&mut self.sender, principal, amount)
    }

    /// Add to recipient-side balance, returning the new balance
    pub fn credit_recipient(&mut self, principal: &Principal, amount: u64) -> Result<u64> {
        credit(&mut self.recipient, principal, amount)
    }

    /// Subtract from sender-side balance, returning the new balance
    pub fn debit_sender(&mut self, principal: &Principal, amount: u64) -> Result<u64> {
        let available = self.sender_balance(principal);
        let remaining = available
            .checked_sub(amount)
            .ok_or(Error::InsufficientBalance {
                required: amount,
                available,
            })?;
        self.sender.insert(principal.clone(), remaining);
        Ok(remaining)
    }

    /// Sum of all sender-side balances
    pub fn total_sender(&self) -> u128 {
        self.sender.values().map(|v| u128::from(*v)).sum()
    }

    /// Sum of all recipient-side balances
    pub fn total_recipient(&self) -> u128 {
        self.recipient.values().map(|v| u128::from(*v)).sum()
    }
}

fn credit(book: &mut HashMap<Principal, u64>, principal: &Principal, amount: u64) -> Result<u64> {
    let current = book.get(principal).copied().unwrap_or(0);
    let updated = current
        .checked_add(amount)
        .ok_or_else(|| Error::InvalidAmount(format!("balance overflow for {}", principal)))?;
    book.insert(principal.clone(), updated);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_principal_reads_zero() {
        let store = BalanceStore::new();
        assert_eq!(store.sender_balance(&Principal::new("nobody")), 0);
        assert_eq!(store.recipient_balance(&Principal::new("nobody")), 0);
    }

    #[test]
    fn test_deposit_and_debit() {
        let mut store = BalanceStore::new();
        let alice = Principal::new("ST1TEST");

        assert_eq!(store.deposit(&alice, 2000).unwrap(), 2000);
        assert_eq!(store.deposit(&alice, 500).unwrap(), 2500);
        assert_eq!(store.debit_sender(&alice, 1005).unwrap(), 1495);

        let err = store.debit_sender(&alice, 5000).unwrap_err();
        assert_eq!(err, Error::InsufficientBalance { required: 5000, available: 1495 });
        assert_eq!(store.sender_balance(&alice), 1495);
    }

    #[test]
    fn test_zero_deposit_rejected() {
        let mut store = BalanceStore::new();
        assert!(matches!(
            store.deposit(&Principal::new("ST1TEST"), 0),
            Err(Error::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_overflow_leaves_balance_untouched() {
        let mut store = BalanceStore::new();
        let alice = Principal::new("ST1TEST");
        store.deposit(&alice, u64::MAX).unwrap();
        assert!(store.deposit(&alice, 1).is_err());
        assert_eq!(store.sender_balance(&alice), u64::MAX);
    }

    #[test]
    fn test_books_are_independent() {
        let mut store = BalanceStore::new();
        let bob = Principal::new("ST3RECIP");
        store.credit_recipient(&bob, 1000).unwrap();
        assert_eq!(store.sender_balance(&bob), 0);
        assert_eq!(store.recipient_balance(&bob), 1000);
        assert_eq!(store.total_recipient(), 1000);
        assert_eq!(store.total_sender(), 0);
    }
}
