//! Shared security primitives for the vault
//!
//! Owner-gated administration, the deposit circuit breaker, the emergency
//! exit switch and the minimum-deposit check. Each guard is a small state
//! holder; the vault decides which guard applies to which entry point.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::errors::VaultError;

/// Single-owner access control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownable {
    owner: Address,
}

impl Ownable {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, caller: &Address) -> bool {
        self.owner == *caller
    }

    /// Fail with `Unauthorized` unless `caller` is the owner.
    pub fn only_owner(&self, caller: &Address) -> Result<(), VaultError> {
        if !self.is_owner(caller) {
            return Err(VaultError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    /// Hand ownership to `new_owner`. Returns the previous owner.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<Address, VaultError> {
        self.only_owner(caller)?;
        if new_owner == Address::ZERO {
            return Err(VaultError::InvalidReceiver {
                receiver: new_owner,
            });
        }
        Ok(std::mem::replace(&mut self.owner, new_owner))
    }
}

/// Circuit breaker for the deposit side.
///
/// `pause`/`unpause` report whether the flag actually changed so the caller
/// emits an event only on a real transition.
#[derive(Debug, Clone, Default)]
pub struct PauseGuard {
    paused: bool,
}

impl PauseGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&mut self) -> bool {
        !std::mem::replace(&mut self.paused, true)
    }

    pub fn unpause(&mut self) -> bool {
        std::mem::replace(&mut self.paused, false)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn check_not_paused(&self) -> Result<(), VaultError> {
        if self.paused {
            return Err(VaultError::VaultPaused);
        }
        Ok(())
    }
}

/// Gate for the slippage-unchecked exit. Off unless the owner turns it on.
#[derive(Debug, Clone, Default)]
pub struct EmergencySwitch {
    active: bool,
}

impl EmergencySwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Returns `true` if it changed.
    pub fn set(&mut self, enabled: bool) -> bool {
        std::mem::replace(&mut self.active, enabled) != enabled
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn check_active(&self) -> Result<(), VaultError> {
        if !self.active {
            return Err(VaultError::EmergencyModeInactive);
        }
        Ok(())
    }
}

/// Reject a nonzero `assets` amount below `minimum`.
///
/// A zero amount passes; callers treat it as a no-op before reaching here.
pub fn ensure_min_deposit(assets: U256, minimum: U256) -> Result<(), VaultError> {
    if !assets.is_zero() && assets < minimum {
        return Err(VaultError::BelowMinimumDeposit { assets, minimum });
    }
    Ok(())
}
