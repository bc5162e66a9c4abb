//! Share ledger: vault share balances, allowances and supply
//!
//! Invariants:
//! - `Σ balances == total_supply`
//! - the sink address holds exactly its genesis balance forever: it is never
//!   debited and never credited after construction

use alloy_primitives::{Address, U256};
use std::collections::HashMap;
use types::errors::TokenError;

use crate::errors::VaultError;

/// Fungible share bookkeeping.
#[derive(Debug, Clone)]
pub struct ShareLedger {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    total_supply: U256,
    sink: Address,
}

impl ShareLedger {
    /// Create a ledger whose only balance is `genesis` shares held by `sink`.
    pub fn with_sink(sink: Address, genesis: U256) -> Self {
        let mut balances = HashMap::new();
        balances.insert(sink, genesis);
        Self {
            balances,
            allowances: HashMap::new(),
            total_supply: genesis,
            sink,
        }
    }

    pub fn balance_of(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or(U256::ZERO)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn sink(&self) -> Address {
        self.sink
    }

    /// Number of accounts with a nonzero balance, sink included.
    pub fn holders(&self) -> usize {
        self.balances.values().filter(|b| !b.is_zero()).count()
    }

    /// `Σ balances == total_supply`.
    pub fn is_conserved(&self) -> bool {
        let mut sum = U256::ZERO;
        for balance in self.balances.values() {
            match sum.checked_add(*balance) {
                Some(next) => sum = next,
                None => return false,
            }
        }
        sum == self.total_supply
    }

    /// Reject receivers that may never be credited.
    pub fn ensure_receivable(&self, receiver: &Address) -> Result<(), VaultError> {
        if *receiver == Address::ZERO || *receiver == self.sink {
            return Err(VaultError::InvalidReceiver {
                receiver: *receiver,
            });
        }
        Ok(())
    }

    /// Reject owners that may never be debited.
    pub fn ensure_debitable(&self, owner: &Address) -> Result<(), VaultError> {
        if *owner == self.sink {
            return Err(VaultError::DeadSharesLocked);
        }
        Ok(())
    }

    /// Check that `mint(to, amount)` would succeed without applying it.
    pub fn check_mint(&self, to: &Address, amount: U256) -> Result<(), VaultError> {
        self.ensure_receivable(to)?;
        self.total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        Ok(())
    }

    pub fn mint(&mut self, to: Address, amount: U256) -> Result<(), VaultError> {
        self.check_mint(&to, amount)?;
        self.total_supply += amount;
        *self.balances.entry(to).or_insert(U256::ZERO) += amount;
        Ok(())
    }

    pub fn burn(&mut self, from: Address, amount: U256) -> Result<(), VaultError> {
        self.ensure_debitable(&from)?;
        self.debit(from, amount)?;
        self.total_supply -= amount;
        Ok(())
    }

    /// Reverse a `burn` of the same `amount` from the same account.
    ///
    /// Only called while compensating an aborted operation, right after the
    /// burn it undoes, so it cannot overflow.
    pub(crate) fn restore_burn(&mut self, from: Address, amount: U256) {
        self.total_supply += amount;
        *self.balances.entry(from).or_insert(U256::ZERO) += amount;
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), VaultError> {
        self.ensure_debitable(&from)?;
        self.ensure_receivable(&to)?;
        self.debit(from, amount)?;
        *self.balances.entry(to).or_insert(U256::ZERO) += amount;
        Ok(())
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) -> Result<(), VaultError> {
        if spender == Address::ZERO {
            return Err(VaultError::InvalidReceiver { receiver: spender });
        }
        self.allowances.insert((owner, spender), amount);
        Ok(())
    }

    /// Consume `amount` of `spender`'s allowance over `owner`'s shares.
    ///
    /// An allowance of `U256::MAX` is unlimited and never decreases. Returns
    /// the allowance before spending so the caller can restore it.
    pub fn spend_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<U256, VaultError> {
        let current = self.allowance(&owner, &spender);
        if current == U256::MAX {
            return Ok(current);
        }
        if current < amount {
            return Err(VaultError::InsufficientAllowance {
                owner,
                spender,
                required: amount,
                available: current,
            });
        }
        self.allowances.insert((owner, spender), current - amount);
        Ok(current)
    }

    /// Put an allowance back to a value returned by `spend_allowance`.
    pub(crate) fn restore_allowance(&mut self, owner: Address, spender: Address, previous: U256) {
        self.allowances.insert((owner, spender), previous);
    }

    fn debit(&mut self, from: Address, amount: U256) -> Result<(), VaultError> {
        let available = self.balance_of(&from);
        if available < amount {
            return Err(VaultError::InsufficientBalance {
                account: from,
                required: amount,
                available,
            });
        }
        self.balances.insert(from, available - amount);
        Ok(())
    }
}
