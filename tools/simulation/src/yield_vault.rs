//! In-memory external yield protocol
//!
//! A share-based vault over a [`SharedToken`]. Its assets are simply its own
//! token balance, so minting tokens to it is yield and a redemption haircut
//! leaves value behind for the remaining holders.
//!
//! Fault injection for tests:
//! - `set_redeem_haircut_bps`: pay out less than the share value
//! - `fail_next_redeem`: revert the next redeem once
//! - `fail_deposits`: revert every deposit until cleared
//! - `set_liquidity`: cap the assets a single redeem can release

use alloy_primitives::{Address, U256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use types::errors::{ProtocolError, TokenError};
use types::interfaces::{BaseAsset, YieldSource};
use types::numeric::{bps_of, mul_div, Rounding};

use crate::token::SharedToken;

/// Yield protocol state.
#[derive(Debug)]
pub struct MockYieldVault {
    address: Address,
    token: SharedToken,
    shares: HashMap<Address, U256>,
    total_shares: U256,
    haircut_bps: u64,
    fail_next_redeem: bool,
    fail_deposits: bool,
    liquidity: Option<U256>,
}

impl MockYieldVault {
    pub fn new(address: Address, token: SharedToken) -> Self {
        Self {
            address,
            token,
            shares: HashMap::new(),
            total_shares: U256::ZERO,
            haircut_bps: 0,
            fail_next_redeem: false,
            fail_deposits: false,
            liquidity: None,
        }
    }

    pub fn total_assets(&self) -> U256 {
        self.token.balance(self.address)
    }

    pub fn shares_of(&self, account: &Address) -> U256 {
        self.shares.get(account).copied().unwrap_or(U256::ZERO)
    }

    /// Floor conversion; 1:1 while no shares exist.
    fn to_assets(&self, shares: U256) -> U256 {
        if self.total_shares.is_zero() {
            return shares;
        }
        mul_div(shares, self.total_assets(), self.total_shares, Rounding::Floor).unwrap_or(U256::ZERO)
    }

    fn to_shares(&self, assets: U256, rounding: Rounding) -> Result<U256, ProtocolError> {
        let total_assets = self.total_assets();
        if self.total_shares.is_zero() || total_assets.is_zero() {
            return Ok(assets);
        }
        mul_div(assets, self.total_shares, total_assets, rounding).map_err(|err| ProtocolError::Reverted {
            reason: err.to_string(),
        })
    }

    fn deposit(&mut self, depositor: Address, assets: U256, receiver: Address) -> Result<U256, ProtocolError> {
        if self.fail_deposits {
            return Err(ProtocolError::Reverted {
                reason: "deposits disabled".to_string(),
            });
        }
        // Dust below one share is accepted and accrues to existing holders
        let minted = self.to_shares(assets, Rounding::Floor)?;
        // Forward approval from the depositor is implied
        self.token.transfer(depositor, self.address, assets)?;
        self.total_shares += minted;
        *self.shares.entry(receiver).or_insert(U256::ZERO) += minted;
        Ok(minted)
    }

    fn redeem(&mut self, shares: U256, receiver: Address, owner: Address) -> Result<U256, ProtocolError> {
        if std::mem::take(&mut self.fail_next_redeem) {
            return Err(ProtocolError::Reverted {
                reason: "redeem reverted".to_string(),
            });
        }
        let held = self.shares_of(&owner);
        if held < shares {
            return Err(ProtocolError::Token(TokenError::InsufficientBalance {
                account: owner,
                required: shares,
                available: held,
            }));
        }

        let gross = self.to_assets(shares);
        let haircut = bps_of(gross, self.haircut_bps, Rounding::Ceiling).map_err(|err| {
            ProtocolError::Reverted {
                reason: err.to_string(),
            }
        })?;
        let paid = gross.saturating_sub(haircut);
        if let Some(available) = self.liquidity {
            if paid > available {
                return Err(ProtocolError::InsufficientLiquidity {
                    requested: paid,
                    available,
                });
            }
        }

        self.token.transfer(self.address, receiver, paid)?;
        self.shares.insert(owner, held - shares);
        self.total_shares -= shares;
        Ok(paid)
    }
}

/// Shared handle to a [`MockYieldVault`].
#[derive(Debug, Clone)]
pub struct SharedYieldVault {
    inner: Rc<RefCell<MockYieldVault>>,
}

impl SharedYieldVault {
    pub fn new(address: Address, token: SharedToken) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MockYieldVault::new(address, token))),
        }
    }

    pub fn address(&self) -> Address {
        self.inner.borrow().address
    }

    pub fn total_assets(&self) -> U256 {
        self.inner.borrow().total_assets()
    }

    pub fn total_shares(&self) -> U256 {
        self.inner.borrow().total_shares
    }

    pub fn shares_of(&self, account: Address) -> U256 {
        self.inner.borrow().shares_of(&account)
    }

    /// Grow the protocol's assets by `assets` without minting shares.
    pub fn accrue_yield(&self, assets: U256) -> Result<(), TokenError> {
        let inner = self.inner.borrow();
        inner.token.mint(inner.address, assets)
    }

    pub fn set_redeem_haircut_bps(&self, bps: u64) {
        self.inner.borrow_mut().haircut_bps = bps;
    }

    pub fn fail_next_redeem(&self) {
        self.inner.borrow_mut().fail_next_redeem = true;
    }

    pub fn fail_deposits(&self, fail: bool) {
        self.inner.borrow_mut().fail_deposits = fail;
    }

    pub fn set_liquidity(&self, liquidity: Option<U256>) {
        self.inner.borrow_mut().liquidity = liquidity;
    }
}

impl YieldSource for SharedYieldVault {
    fn balance_of(&self, account: Address) -> U256 {
        self.inner.borrow().shares_of(&account)
    }

    fn convert_to_assets(&self, shares: U256) -> U256 {
        self.inner.borrow().to_assets(shares)
    }

    fn preview_withdraw(&self, assets: U256) -> U256 {
        self.inner
            .borrow()
            .to_shares(assets, Rounding::Ceiling)
            .unwrap_or(U256::MAX)
    }

    fn deposit(&mut self, depositor: Address, assets: U256, receiver: Address) -> Result<U256, ProtocolError> {
        self.inner.borrow_mut().deposit(depositor, assets, receiver)
    }

    fn redeem(&mut self, shares: U256, receiver: Address, owner: Address) -> Result<U256, ProtocolError> {
        self.inner.borrow_mut().redeem(shares, receiver, owner)
    }
}
