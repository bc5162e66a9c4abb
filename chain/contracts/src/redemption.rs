//! Redemption: two-phase exit through the external yield source
//!
//! Every withdraw and redeem runs the same state machine:
//!
//! ```text
//! Idle ──initiate──▶ Initiated ──settle──▶ Settled
//!                        │
//!                        └──abort──▶ Failed (burn undone)
//! ```
//!
//! Initiate burns the owner's vault shares before any external call and
//! sizes the external redemption. An [`InitiatedRedemption`] can only be
//! obtained from that burn, and settling consumes it, so the external call
//! cannot run against unburned shares. Settle redeems from the yield source,
//! verifies the received amount against the slippage floor and pays out. On
//! any failure the burn is reversed exactly and nothing is emitted.
//!
//! Base asset already idle in custody is paid out first; only the remainder
//! is redeemed externally. Assets that cannot be re-deposited stay in
//! custody, where `total_assets` still counts them.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use types::ids::RedemptionId;
use types::interfaces::{BaseAsset, YieldSource};
use types::numeric::{bps_of, min_after_tolerance, mul_div, Rounding};

use crate::conversion;
use crate::errors::VaultError;
use crate::events::{
    EmergencyWithdraw, RedemptionInitiated, RedemptionSettled, SharesBurned, VaultEvent, Withdraw,
};
use crate::vault::Vault;

/// Lifecycle of a single redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedemptionPhase {
    Idle,
    Initiated,
    Settled,
    Failed,
}

/// What the caller fixed: the assets out or the shares in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionRequest {
    /// Exact assets out; shares burned round up
    Assets(U256),
    /// Exact shares in; assets out round down
    Shares(U256),
}

/// A redemption whose vault shares are already burned.
#[must_use = "an initiated redemption must be settled or rolled back"]
#[derive(Debug)]
pub(crate) struct InitiatedRedemption {
    id: RedemptionId,
    caller: Address,
    owner: Address,
    receiver: Address,
    shares: U256,
    expected_assets: U256,
    minimum_assets: U256,
    /// Part of `expected_assets` covered by base asset already in custody
    from_custody: U256,
    external_shares: U256,
    /// Allowance before it was spent, when `caller != owner`
    previous_allowance: Option<U256>,
    /// Events released only on settlement
    staged: Vec<VaultEvent>,
}

/// Outcome of a committed redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettledRedemption {
    pub id: RedemptionId,
    pub phase: RedemptionPhase,
    /// Vault shares burned
    pub shares: U256,
    /// Base asset sent to the receiver
    pub assets_paid: U256,
    /// Base asset released by the yield source
    pub assets_received: U256,
    pub external_shares_redeemed: U256,
}

impl<A: BaseAsset, Y: YieldSource> Vault<A, Y> {
    // ───────────────────────── Withdraw / Redeem ─────────────────────────

    /// Withdraw exactly `assets` from `owner`'s position to `receiver`.
    /// Returns the vault shares burned (ceiling).
    ///
    /// Not blocked by pause. A caller other than `owner` spends its share
    /// allowance.
    pub fn withdraw(
        &mut self,
        caller: Address,
        assets: U256,
        receiver: Address,
        owner: Address,
    ) -> Result<U256, VaultError> {
        if assets.is_zero() {
            return Ok(U256::ZERO);
        }
        let initiated =
            self.initiate_redemption(caller, RedemptionRequest::Assets(assets), receiver, owner)?;
        let settled = self.settle_redemption(initiated)?;
        Ok(settled.shares)
    }

    /// Redeem exactly `shares` of `owner` for the base asset, paid to
    /// `receiver`. Returns the assets paid.
    pub fn redeem(
        &mut self,
        caller: Address,
        shares: U256,
        receiver: Address,
        owner: Address,
    ) -> Result<U256, VaultError> {
        if shares.is_zero() {
            return Ok(U256::ZERO);
        }
        let initiated =
            self.initiate_redemption(caller, RedemptionRequest::Shares(shares), receiver, owner)?;
        let settled = self.settle_redemption(initiated)?;
        Ok(settled.assets_paid)
    }

    /// Phase one: check entitlement, size the external redemption, then burn.
    ///
    /// Everything fallible except the burn runs before any state changes.
    pub(crate) fn initiate_redemption(
        &mut self,
        caller: Address,
        request: RedemptionRequest,
        receiver: Address,
        owner: Address,
    ) -> Result<InitiatedRedemption, VaultError> {
        self.ensure_payable(&receiver)?;
        let totals = self.totals();

        let (shares, expected_assets) = match request {
            RedemptionRequest::Assets(assets) => {
                let max = conversion::assets_for_redeem(self.max_redeem(owner), &totals)?;
                if assets > max {
                    return Err(VaultError::ExceededMaxWithdraw { owner, assets, max });
                }
                (conversion::shares_for_withdraw(assets, &totals)?, assets)
            }
            RedemptionRequest::Shares(shares) => {
                let max = self.max_redeem(owner);
                if shares > max {
                    return Err(VaultError::ExceededMaxRedeem { owner, shares, max });
                }
                let assets = conversion::assets_for_redeem(shares, &totals)?;
                if assets.is_zero() {
                    return Err(VaultError::ZeroAssets { shares });
                }
                (shares, assets)
            }
        };

        let tolerance = self.config.slippage_tolerance_bps;
        let minimum_assets = min_after_tolerance(expected_assets, tolerance)?;
        let from_custody = self.idle_assets().min(expected_assets);
        let external_shares = self.size_external_redemption(expected_assets - from_custody)?;

        let previous_allowance = if caller != owner {
            Some(self.ledger.spend_allowance(owner, caller, shares)?)
        } else {
            None
        };
        if let Err(err) = self.ledger.burn(owner, shares) {
            if let Some(previous) = previous_allowance {
                self.ledger.restore_allowance(owner, caller, previous);
            }
            return Err(err);
        }

        let id = RedemptionId::new();
        let staged = vec![
            VaultEvent::SharesBurned(SharesBurned { owner, shares }),
            VaultEvent::burned(owner, shares),
            VaultEvent::RedemptionInitiated(RedemptionInitiated {
                redemption_id: id,
                owner,
                vault_shares_burned: shares,
                external_shares_to_redeem: external_shares,
                expected_assets,
            }),
        ];
        debug!(
            redemption_id = %id,
            %owner,
            %shares,
            %expected_assets,
            %external_shares,
            "redemption initiated"
        );

        Ok(InitiatedRedemption {
            id,
            caller,
            owner,
            receiver,
            shares,
            expected_assets,
            minimum_assets,
            from_custody,
            external_shares,
            previous_allowance,
            staged,
        })
    }

    /// External shares to redeem for `assets`: the ceiling quote plus a
    /// slippage-tolerance buffer, capped at the vault's external balance.
    fn size_external_redemption(&self, assets: U256) -> Result<U256, VaultError> {
        if assets.is_zero() {
            return Ok(U256::ZERO);
        }
        let held = self.protocol.balance_of(self.config.vault_address);
        let quoted = self.protocol.preview_withdraw(assets);
        let buffer = bps_of(quoted, self.config.slippage_tolerance_bps, Rounding::Ceiling)?;
        Ok(quoted.saturating_add(buffer).min(held))
    }

    /// Phase two: redeem externally, verify, pay out and commit events.
    pub(crate) fn settle_redemption(
        &mut self,
        initiated: InitiatedRedemption,
    ) -> Result<SettledRedemption, VaultError> {
        let vault = self.config.vault_address;
        debug!(
            redemption_id = %initiated.id,
            external_shares = %initiated.external_shares,
            from_custody = %initiated.from_custody,
            "settling redemption"
        );

        let received = if initiated.external_shares.is_zero() {
            U256::ZERO
        } else {
            match self.protocol.redeem(initiated.external_shares, vault, vault) {
                Ok(received) => received,
                Err(err) => {
                    warn!(redemption_id = %initiated.id, error = %err, "external redeem failed");
                    self.rollback_redemption(initiated, U256::ZERO);
                    return Err(VaultError::ExternalProtocolCallFailed(err));
                }
            }
        };

        let available = received.saturating_add(initiated.from_custody);
        if available < initiated.minimum_assets {
            let err = VaultError::SlippageExceeded {
                expected: initiated.expected_assets,
                received: available,
                minimum: initiated.minimum_assets,
            };
            warn!(redemption_id = %initiated.id, %received, "slippage exceeded");
            self.rollback_redemption(initiated, received);
            return Err(err);
        }

        let paid = available.min(initiated.expected_assets);
        if let Err(err) = self.asset.transfer(vault, initiated.receiver, paid) {
            warn!(redemption_id = %initiated.id, error = %err, "payout failed");
            self.rollback_redemption(initiated, received);
            return Err(err.into());
        }
        self.reinvest_or_hold(available - paid);

        let InitiatedRedemption {
            id,
            caller,
            owner,
            receiver,
            shares,
            external_shares,
            staged,
            ..
        } = initiated;

        self.events.extend(staged);
        self.events.push(VaultEvent::RedemptionSettled(RedemptionSettled {
            redemption_id: id,
            external_shares_redeemed: external_shares,
            assets_received: received,
        }));
        self.events.push(VaultEvent::Withdraw(Withdraw {
            caller,
            receiver,
            owner,
            assets: paid,
            shares,
        }));
        info!(
            redemption_id = %id,
            %owner,
            %receiver,
            %shares,
            assets = %paid,
            "redemption settled"
        );

        Ok(SettledRedemption {
            id,
            phase: RedemptionPhase::Settled,
            shares,
            assets_paid: paid,
            assets_received: received,
            external_shares_redeemed: external_shares,
        })
    }

    /// Undo phase one. `received` is base asset already pulled out of the
    /// yield source; it goes back in, or stays counted in custody.
    fn rollback_redemption(&mut self, initiated: InitiatedRedemption, received: U256) {
        self.ledger.restore_burn(initiated.owner, initiated.shares);
        if let Some(previous) = initiated.previous_allowance {
            self.ledger
                .restore_allowance(initiated.owner, initiated.caller, previous);
        }
        self.reinvest_or_hold(received);
        debug!(
            redemption_id = %initiated.id,
            phase = ?RedemptionPhase::Failed,
            staged_events = initiated.staged.len(),
            "redemption rolled back"
        );
    }

    /// Re-deposit `assets` from custody. On failure they stay in custody,
    /// where `total_assets` keeps counting them.
    fn reinvest_or_hold(&mut self, assets: U256) {
        if let Err(err) = self.reinvest(assets) {
            warn!(%assets, error = %err, "re-deposit failed, assets held in custody");
        }
    }

    fn ensure_payable(&self, receiver: &Address) -> Result<(), VaultError> {
        if *receiver == Address::ZERO || *receiver == self.config.vault_address {
            return Err(VaultError::InvalidReceiver {
                receiver: *receiver,
            });
        }
        Ok(())
    }

    // ───────────────────────── Emergency Exit ─────────────────────────

    /// Burn `shares` of the caller and redeem their pro-rata slice of the
    /// vault's external shares, paying whatever the yield source releases.
    ///
    /// Only available in emergency mode. No slippage check.
    pub fn emergency_withdraw(
        &mut self,
        caller: Address,
        shares: U256,
        receiver: Address,
    ) -> Result<U256, VaultError> {
        self.emergency.check_active()?;
        if shares.is_zero() {
            return Ok(U256::ZERO);
        }
        self.ensure_payable(&receiver)?;
        let max = self.max_redeem(caller);
        if shares > max {
            return Err(VaultError::ExceededMaxRedeem {
                owner: caller,
                shares,
                max,
            });
        }

        let vault = self.config.vault_address;
        let held = self.protocol.balance_of(vault);
        let supply = self.totals().effective_supply();
        let external_shares = mul_div(held, shares, supply, Rounding::Floor)?;
        let from_custody = mul_div(self.idle_assets(), shares, supply, Rounding::Floor)?;
        if external_shares.is_zero() && from_custody.is_zero() {
            return Err(VaultError::ZeroAssets { shares });
        }

        self.ledger.burn(caller, shares)?;
        let redeemed = if external_shares.is_zero() {
            Ok(U256::ZERO)
        } else {
            self.protocol.redeem(external_shares, vault, vault)
        };
        let received = match redeemed {
            Ok(received) => received,
            Err(err) => {
                self.ledger.restore_burn(caller, shares);
                return Err(VaultError::ExternalProtocolCallFailed(err));
            }
        };
        let paid = received.saturating_add(from_custody);
        if let Err(err) = self.asset.transfer(vault, receiver, paid) {
            self.ledger.restore_burn(caller, shares);
            self.reinvest_or_hold(received);
            return Err(err.into());
        }

        self.events.push(VaultEvent::SharesBurned(SharesBurned {
            owner: caller,
            shares,
        }));
        self.events.push(VaultEvent::burned(caller, shares));
        self.events.push(VaultEvent::EmergencyWithdraw(EmergencyWithdraw {
            owner: caller,
            receiver,
            shares,
            external_shares_redeemed: external_shares,
            assets: paid,
        }));
        self.events.push(VaultEvent::Withdraw(Withdraw {
            caller,
            receiver,
            owner: caller,
            assets: paid,
            shares,
        }));
        warn!(%caller, %receiver, %shares, assets = %paid, "emergency withdraw");
        Ok(paid)
    }
}
