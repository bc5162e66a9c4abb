//! Wired test world
//!
//! One vault over one in-memory token and yield protocol, plus a set of
//! funded users that have approved the vault for their base asset.

use alloy_primitives::{Address, U256};
use contracts::{Vault, VaultConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::interfaces::{BaseAsset, YieldSource};

use crate::token::SharedToken;
use crate::yield_vault::SharedYieldVault;
use crate::SimError;

pub type SimVault = Vault<SharedToken, SharedYieldVault>;

/// Point-in-time view of the world's accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub total_assets: U256,
    pub total_supply: U256,
    /// Base asset sitting in vault custody outside the yield protocol
    pub idle_assets: U256,
    pub share_price: Option<Decimal>,
    pub paused: bool,
}

pub struct VaultWorld {
    pub vault: SimVault,
    pub token: SharedToken,
    pub protocol: SharedYieldVault,
    pub owner: Address,
    users: Vec<Address>,
}

impl VaultWorld {
    /// Deploy a vault and fund `user_count` users with `funding` each.
    pub fn new(config: VaultConfig, user_count: usize, funding: U256) -> Result<Self, SimError> {
        let token = SharedToken::new();
        let protocol = SharedYieldVault::new(config.protocol_address, token.clone());
        let owner = Address::repeat_byte(0x0a);
        let vault = Vault::new(config, owner, token.clone(), protocol.clone())?;

        let mut world = Self {
            vault,
            token,
            protocol,
            owner,
            users: Vec::with_capacity(user_count),
        };
        for index in 0..user_count {
            let user = user_address(index);
            world.fund(user, funding)?;
            world.users.push(user);
        }
        Ok(world)
    }

    pub fn with_defaults(user_count: usize, funding: U256) -> Result<Self, SimError> {
        Self::new(VaultConfig::default(), user_count, funding)
    }

    pub fn users(&self) -> &[Address] {
        &self.users
    }

    /// The `index`-th user, wrapping around the funded set.
    pub fn user(&self, index: usize) -> Address {
        self.users
            .get(index % self.users.len().max(1))
            .copied()
            .unwrap_or_else(|| user_address(index))
    }

    /// Mint base asset to `account` and approve the vault to pull it.
    pub fn fund(&self, account: Address, amount: U256) -> Result<(), SimError> {
        self.token.mint(account, amount)?;
        self.token
            .approve(account, self.vault.vault_address(), U256::MAX);
        Ok(())
    }

    /// Send `amount` of the base asset straight to the yield protocol,
    /// raising the value of every protocol share.
    pub fn donate(&mut self, from: Address, amount: U256) -> Result<(), SimError> {
        let protocol = self.protocol.address();
        self.token.transfer(from, protocol, amount)?;
        Ok(())
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            total_assets: self.vault.total_assets(),
            total_supply: self.vault.total_supply(),
            idle_assets: self.vault.idle_assets(),
            share_price: self.vault.share_price(),
            paused: self.vault.is_paused(),
        }
    }

    /// Vault invariants plus accounting: `total_assets` is the external
    /// position plus custody, and the users' claims never exceed it.
    pub fn check_invariants(&self) -> Result<(), SimError> {
        if !self.vault.invariants_hold() {
            return Err(SimError::InvariantViolated(
                "share ledger or dead shares out of balance".to_string(),
            ));
        }

        let vault_address = self.vault.vault_address();
        let external = self
            .protocol
            .convert_to_assets(self.protocol.shares_of(vault_address));
        let idle = self.token.balance(vault_address);
        let total_assets = self.vault.total_assets();
        if total_assets != external + idle {
            return Err(SimError::InvariantViolated(format!(
                "total assets {total_assets} != external {external} + custody {idle}"
            )));
        }

        let mut claims = U256::ZERO;
        for user in &self.users {
            claims += self.vault.preview_redeem(self.vault.balance_of(*user))?;
        }
        if claims > total_assets {
            return Err(SimError::InvariantViolated(format!(
                "user claims {claims} exceed total assets {total_assets}"
            )));
        }
        Ok(())
    }
}

/// Deterministic address for the `index`-th simulated user.
pub fn user_address(index: usize) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0x11;
    bytes[12..].copy_from_slice(&(index as u64).to_be_bytes());
    Address::from(bytes)
}
