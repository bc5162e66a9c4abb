//! Vault events
//!
//! Events are immutable records emitted by committed operations. An aborted
//! operation emits nothing.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use types::ids::RedemptionId;

/// Base asset deposited and shares minted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub caller: Address,
    pub receiver: Address,
    pub assets: U256,
    pub shares: U256,
}

/// Shares burned and base asset paid out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdraw {
    pub caller: Address,
    pub receiver: Address,
    pub owner: Address,
    pub assets: U256,
    pub shares: U256,
}

/// Share movement. Mints come from and burns go to `Address::ZERO`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// Share allowance set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
}

/// First phase of a redemption: vault shares burned, external redemption sized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionInitiated {
    pub redemption_id: RedemptionId,
    pub owner: Address,
    pub vault_shares_burned: U256,
    pub external_shares_to_redeem: U256,
    pub expected_assets: U256,
}

/// Second phase of a redemption: external shares redeemed and verified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionSettled {
    pub redemption_id: RedemptionId,
    pub external_shares_redeemed: U256,
    pub assets_received: U256,
}

/// Vault shares removed from an owner's balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharesBurned {
    pub owner: Address,
    pub shares: U256,
}

/// Slippage-unchecked exit through the emergency path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyWithdraw {
    pub owner: Address,
    pub receiver: Address,
    pub shares: U256,
    pub external_shares_redeemed: U256,
    pub assets: U256,
}

/// Enum wrapper for all vault events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    Deposit(Deposit),
    Withdraw(Withdraw),
    Transfer(Transfer),
    Approval(Approval),
    RedemptionInitiated(RedemptionInitiated),
    RedemptionSettled(RedemptionSettled),
    SharesBurned(SharesBurned),
    EmergencyWithdraw(EmergencyWithdraw),
    Paused { account: Address },
    Unpaused { account: Address },
    EmergencyModeChanged { account: Address, enabled: bool },
    OwnershipTransferred { previous_owner: Address, new_owner: Address },
}

impl VaultEvent {
    /// Mint record: `Transfer(0 -> to)`.
    pub fn minted(to: Address, value: U256) -> Self {
        VaultEvent::Transfer(Transfer {
            from: Address::ZERO,
            to,
            value,
        })
    }

    /// Burn record: `Transfer(from -> 0)`.
    pub fn burned(from: Address, value: U256) -> Self {
        VaultEvent::Transfer(Transfer {
            from,
            to: Address::ZERO,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_serialization() {
        let event = VaultEvent::Deposit(Deposit {
            caller: Address::repeat_byte(1),
            receiver: Address::repeat_byte(2),
            assets: U256::from(100_000_000u64),
            shares: U256::from(100_000_000_000_000_000_000u128),
        });
        let json = serde_json::to_string(&event).unwrap();
        let deser: VaultEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_minted_and_burned_helpers() {
        let holder = Address::repeat_byte(7);
        let minted = VaultEvent::minted(holder, U256::from(5u64));
        let burned = VaultEvent::burned(holder, U256::from(5u64));
        assert!(matches!(minted, VaultEvent::Transfer(Transfer { from, .. }) if from == Address::ZERO));
        assert!(matches!(burned, VaultEvent::Transfer(Transfer { to, .. }) if to == Address::ZERO));
    }

    #[test]
    fn test_redemption_events_share_id() {
        let id = RedemptionId::new();
        let initiated = RedemptionInitiated {
            redemption_id: id,
            owner: Address::repeat_byte(3),
            vault_shares_burned: U256::from(10u64),
            external_shares_to_redeem: U256::from(11u64),
            expected_assets: U256::from(10u64),
        };
        let settled = RedemptionSettled {
            redemption_id: id,
            external_shares_redeemed: U256::from(11u64),
            assets_received: U256::from(10u64),
        };
        assert_eq!(initiated.redemption_id, settled.redemption_id);
    }
}
