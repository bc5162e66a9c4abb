//! Conversion engine: asset/share arithmetic
//!
//! Pure functions over a [`Totals`] snapshot. Dead shares are excluded from
//! every proportional claim: only the effective supply
//! `total_shares - dead_shares` is priced.
//!
//! Quotes run against a virtual offset: `10^(share_decimals - asset_decimals)`
//! virtual shares and one virtual asset unit.
//!
//! ```text
//! shares = assets × (effective_supply + scale) / (total_assets + 1)
//! assets = shares × (total_assets + 1) / (effective_supply + scale)
//! ```
//!
//! An empty vault therefore prices at 1:1 up to the decimal scale (10^12 for
//! USDC → rfUSDC), and a donation cannot push the price of the few share units
//! an attacker leaves outstanding: the virtual shares absorb it.
//!
//! Rounding always favors the vault:
//! - deposit: shares out, floor
//! - mint: assets in, ceiling
//! - withdraw: shares in, ceiling
//! - redeem: assets out, floor

use alloy_primitives::U256;
use types::errors::MathError;
use types::numeric::{mul_div, Rounding};

use crate::errors::VaultError;

/// Inputs of every conversion, captured once per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    /// Base-asset value held by the vault, external position plus custody
    pub total_assets: U256,
    /// All minted shares, dead shares included
    pub total_shares: U256,
    pub dead_shares: U256,
    /// Virtual share offset, `10^(share_decimals - asset_decimals)`
    pub scale: U256,
}

impl Totals {
    /// Shares that carry a claim on the assets.
    pub fn effective_supply(&self) -> U256 {
        self.total_shares.saturating_sub(self.dead_shares)
    }

    fn virtual_shares(&self) -> Result<U256, VaultError> {
        self.effective_supply()
            .checked_add(self.scale)
            .ok_or(VaultError::Math(MathError::Overflow))
    }

    fn virtual_assets(&self) -> Result<U256, VaultError> {
        self.total_assets
            .checked_add(U256::from(1u8))
            .ok_or(VaultError::Math(MathError::Overflow))
    }

    /// Outstanding user shares with nothing behind them.
    fn ensure_backed(&self) -> Result<(), VaultError> {
        if self.total_assets.is_zero() && !self.effective_supply().is_zero() {
            return Err(VaultError::Insolvent);
        }
        Ok(())
    }

    fn to_shares(&self, assets: U256, rounding: Rounding) -> Result<U256, VaultError> {
        Ok(mul_div(assets, self.virtual_shares()?, self.virtual_assets()?, rounding)?)
    }

    fn to_assets(&self, shares: U256, rounding: Rounding) -> Result<U256, VaultError> {
        Ok(mul_div(shares, self.virtual_assets()?, self.virtual_shares()?, rounding)?)
    }
}

/// Shares minted for depositing `assets` (floor).
pub fn shares_for_deposit(assets: U256, totals: &Totals) -> Result<U256, VaultError> {
    totals.ensure_backed()?;
    totals.to_shares(assets, Rounding::Floor)
}

/// Assets charged for minting exactly `shares` (ceiling).
pub fn assets_for_mint(shares: U256, totals: &Totals) -> Result<U256, VaultError> {
    totals.ensure_backed()?;
    totals.to_assets(shares, Rounding::Ceiling)
}

/// Assets released for redeeming `shares` (floor).
pub fn assets_for_redeem(shares: U256, totals: &Totals) -> Result<U256, VaultError> {
    totals.to_assets(shares, Rounding::Floor)
}

/// Shares burned for withdrawing exactly `assets` (ceiling).
pub fn shares_for_withdraw(assets: U256, totals: &Totals) -> Result<U256, VaultError> {
    if assets.is_zero() {
        return Ok(U256::ZERO);
    }
    totals.ensure_backed()?;
    totals.to_shares(assets, Rounding::Ceiling)
}
