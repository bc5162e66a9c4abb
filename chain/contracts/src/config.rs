//! Vault configuration
//!
//! Constants fixed at construction. The defaults reproduce the observed
//! deployment: USDC (6 decimals) into a Morpho vault on Base, rfUSDC shares
//! with 18 decimals.

use alloy_primitives::{address, Address, U256};
use serde::{Deserialize, Serialize};
use types::ids::DEAD_ADDRESS;
use types::numeric::{pow10, BASIS_POINTS};

use crate::errors::ConfigError;

/// Construction-time vault parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Share token name
    pub name: String,
    /// Share token symbol
    pub symbol: String,
    /// Fractional digits of the base asset
    pub asset_decimals: u8,
    /// Fractional digits of the vault share
    pub share_decimals: u8,
    /// Smallest nonzero deposit, in base-asset units
    pub min_deposit: U256,
    /// Shares minted to `dead_address` at construction
    pub dead_shares: U256,
    /// Unspendable sink for the dead shares
    pub dead_address: Address,
    /// Tolerated shortfall on external redemption, in basis points
    pub slippage_tolerance_bps: u64,
    /// Address under which the vault holds custody
    pub vault_address: Address,
    /// Base-asset token address
    pub asset_address: Address,
    /// External yield protocol address
    pub protocol_address: Address,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            name: "RiseFi USDC Vault Share".to_string(),
            symbol: "rfUSDC".to_string(),
            asset_decimals: 6,
            share_decimals: 18,
            min_deposit: U256::from(1_000_000u64),
            dead_shares: U256::from(1_000u64),
            dead_address: DEAD_ADDRESS,
            slippage_tolerance_bps: 50,
            vault_address: address!("5a629b4f8c0176715599a45d0bc57322e8ce1848"),
            asset_address: address!("833589fcd6edb6e08f4c7c32d4f71b54bda02913"),
            protocol_address: address!("3128a0f7f0ea68e7b7c9b00afa7e41045828e858"),
        }
    }
}

impl VaultConfig {
    /// Parse a config from JSON. Omitted fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.share_decimals < self.asset_decimals {
            return Err(ConfigError::DecimalsMismatch {
                asset: self.asset_decimals,
                share: self.share_decimals,
            });
        }
        self.decimal_scale()?;

        if self.slippage_tolerance_bps >= BASIS_POINTS {
            return Err(ConfigError::InvalidSlippageTolerance {
                bps: self.slippage_tolerance_bps,
                max: BASIS_POINTS,
            });
        }

        if self.dead_shares.is_zero() {
            return Err(ConfigError::ZeroDeadShares);
        }

        if self.dead_address == Address::ZERO {
            return Err(ConfigError::InvalidAddress {
                field: "dead_address",
                address: self.dead_address,
            });
        }
        if self.vault_address == Address::ZERO || self.vault_address == self.dead_address {
            return Err(ConfigError::InvalidAddress {
                field: "vault_address",
                address: self.vault_address,
            });
        }
        Ok(())
    }

    /// `10^(share_decimals - asset_decimals)`: the virtual share offset, and
    /// the shares per base-asset unit in an empty vault.
    pub fn decimal_scale(&self) -> Result<U256, ConfigError> {
        let offset = self.share_decimals.saturating_sub(self.asset_decimals);
        pow10(offset).map_err(|_| ConfigError::ScaleOverflow { offset })
    }
}
