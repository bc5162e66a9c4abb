//! Interfaces of the vault's external collaborators
//!
//! The vault never sees the internals of either collaborator. The base asset
//! is a plain fungible token; the yield source is a share-based vault that
//! compounds outside the vault's control. Return values of the yield source
//! are untrusted and always checked by the caller.

use alloy_primitives::{Address, U256};

use crate::errors::{ProtocolError, TokenError};

/// Fungible base-asset token (USDC in the observed deployment).
pub trait BaseAsset {
    /// Raw token units held by `account`.
    fn balance_of(&self, account: Address) -> U256;

    /// Remaining amount `spender` may move on behalf of `owner`.
    fn allowance(&self, owner: Address, spender: Address) -> U256;

    /// Move `amount` from `from` to `to`, authorized by `from` itself.
    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to`, spending `spender`'s allowance.
    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError>;
}

/// External share-based yield protocol.
pub trait YieldSource {
    /// External shares held by `account`.
    fn balance_of(&self, account: Address) -> U256;

    /// Base-asset value of `shares` at the current exchange rate (floor).
    fn convert_to_assets(&self, shares: U256) -> U256;

    /// External shares that must be burned to release `assets` (ceiling).
    fn preview_withdraw(&self, assets: U256) -> U256;

    /// Pull `assets` of the base asset from `depositor` and credit external
    /// shares to `receiver`. Returns the external shares minted.
    fn deposit(
        &mut self,
        depositor: Address,
        assets: U256,
        receiver: Address,
    ) -> Result<U256, ProtocolError>;

    /// Burn `shares` of `owner` and send the released base asset to
    /// `receiver`. Returns the base-asset amount actually released.
    fn redeem(
        &mut self,
        shares: U256,
        receiver: Address,
        owner: Address,
    ) -> Result<U256, ProtocolError>;
}
