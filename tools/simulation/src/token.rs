//! In-memory base-asset token
//!
//! [`MockToken`] is a plain fungible token with balances and allowances.
//! [`SharedToken`] is a cloneable handle to one token, so the vault, the
//! yield protocol and the test harness all see the same balances.

use alloy_primitives::{Address, U256};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use types::errors::TokenError;
use types::interfaces::BaseAsset;

/// Fungible token state.
#[derive(Debug, Clone, Default)]
pub struct MockToken {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    total_supply: U256,
    /// Accounts that refuse incoming transfers
    blocked: HashSet<Address>,
}

impl MockToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, account: &Address) -> U256 {
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

    /// Create `amount` new units for `to`.
    pub fn mint(&mut self, to: Address, amount: U256) -> Result<(), TokenError> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        *self.balances.entry(to).or_insert(U256::ZERO) += amount;
        Ok(())
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((owner, spender), amount);
    }

    pub fn set_blocked(&mut self, account: Address, blocked: bool) {
        if blocked {
            self.blocked.insert(account);
        } else {
            self.blocked.remove(&account);
        }
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        if to == Address::ZERO || self.blocked.contains(&to) {
            return Err(TokenError::InvalidReceiver { receiver: to });
        }
        let available = self.balance(&from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account: from,
                required: amount,
                available,
            });
        }
        self.balances.insert(from, available - amount);
        *self.balances.entry(to).or_insert(U256::ZERO) += amount;
        Ok(())
    }

    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let current = self.allowance(&from, &spender);
        if current < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: from,
                spender,
                required: amount,
                available: current,
            });
        }
        self.transfer(from, to, amount)?;
        if current != U256::MAX {
            self.allowances.insert((from, spender), current - amount);
        }
        Ok(())
    }
}

/// Shared handle to a [`MockToken`].
#[derive(Debug, Clone, Default)]
pub struct SharedToken {
    inner: Rc<RefCell<MockToken>>,
}

impl SharedToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.inner.borrow().balance(&account)
    }

    pub fn total_supply(&self) -> U256 {
        self.inner.borrow().total_supply()
    }

    pub fn mint(&self, to: Address, amount: U256) -> Result<(), TokenError> {
        self.inner.borrow_mut().mint(to, amount)
    }

    pub fn approve(&self, owner: Address, spender: Address, amount: U256) {
        self.inner.borrow_mut().approve(owner, spender, amount);
    }

    /// Make `account` reject incoming transfers.
    pub fn set_blocked(&self, account: Address, blocked: bool) {
        self.inner.borrow_mut().set_blocked(account, blocked);
    }
}

impl BaseAsset for SharedToken {
    fn balance_of(&self, account: Address) -> U256 {
        self.inner.borrow().balance(&account)
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.inner.borrow().allowance(&owner, &spender)
    }

    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        self.inner.borrow_mut().transfer(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.inner.borrow_mut().transfer_from(spender, from, to, amount)
    }
}
