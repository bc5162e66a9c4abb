//! Vault: share accounting, deposit path and administration
//!
//! Holds custody of the base asset through a single external yield source.
//! `total_assets` is never stored: it is read from the yield source and the
//! vault's own base-asset balance on every call, so yield accrues to share
//! holders without any vault write. Base asset left in custody after a failed
//! re-deposit stays in the accounting and is swept back on the next deposit.
//!
//! All state-changing operations check, in order:
//! 1. Access control (admin entry points)
//! 2. Pause state (deposit side only)
//! 3. Minimum deposit
//! 4. Entitlement and allowance (redemption side, see `redemption`)
//!
//! The redemption side lives in [`crate::redemption`].

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use types::interfaces::{BaseAsset, YieldSource};
use types::numeric::{pow10, to_decimal, BASIS_POINTS};

use crate::config::VaultConfig;
use crate::conversion::{self, Totals};
use crate::errors::{ConfigError, VaultError};
use crate::events::{Approval, Deposit, Transfer, VaultEvent};
use crate::ledger::ShareLedger;
use crate::security::{ensure_min_deposit, EmergencySwitch, Ownable, PauseGuard};

/// Single-asset yield vault.
///
/// Generic over its two collaborators so the same accounting runs against a
/// live token/protocol pair or the in-memory ones in `simulation`.
#[derive(Debug)]
pub struct Vault<A, Y> {
    pub(crate) config: VaultConfig,
    /// Virtual share offset, also the empty-vault shares per base-asset unit
    scale: U256,
    pub(crate) ledger: ShareLedger,
    access: Ownable,
    pause_guard: PauseGuard,
    pub(crate) emergency: EmergencySwitch,
    pub(crate) asset: A,
    pub(crate) protocol: Y,
    /// Emitted events log (append-only)
    pub(crate) events: Vec<VaultEvent>,
}

impl<A: BaseAsset, Y: YieldSource> Vault<A, Y> {
    /// Deploy a vault. Dead shares are minted to the dead address here, before
    /// any deposit can happen.
    pub fn new(config: VaultConfig, owner: Address, asset: A, protocol: Y) -> Result<Self, ConfigError> {
        config.validate()?;
        if owner == Address::ZERO {
            return Err(ConfigError::InvalidAddress {
                field: "owner",
                address: owner,
            });
        }
        let scale = config.decimal_scale()?;
        let ledger = ShareLedger::with_sink(config.dead_address, config.dead_shares);
        let events = vec![VaultEvent::minted(config.dead_address, config.dead_shares)];

        info!(
            vault = %config.vault_address,
            %owner,
            dead_shares = %config.dead_shares,
            "vault deployed"
        );

        Ok(Self {
            config,
            scale,
            ledger,
            access: Ownable::new(owner),
            pause_guard: PauseGuard::new(),
            emergency: EmergencySwitch::new(),
            asset,
            protocol,
            events,
        })
    }

    /// Deploy with the default configuration.
    pub fn with_defaults(owner: Address, asset: A, protocol: Y) -> Result<Self, ConfigError> {
        Self::new(VaultConfig::default(), owner, asset, protocol)
    }

    // ───────────────────────── Accounting Reads ─────────────────────────

    /// Base-asset value of the vault: external position plus custody.
    pub fn total_assets(&self) -> U256 {
        let held = self.protocol.balance_of(self.config.vault_address);
        self.protocol
            .convert_to_assets(held)
            .saturating_add(self.idle_assets())
    }

    /// Base asset sitting in vault custody outside the yield source.
    pub fn idle_assets(&self) -> U256 {
        self.asset.balance_of(self.config.vault_address)
    }

    /// All minted shares, dead shares included.
    pub fn total_supply(&self) -> U256 {
        self.ledger.total_supply()
    }

    /// Snapshot of the conversion inputs.
    pub fn totals(&self) -> Totals {
        Totals {
            total_assets: self.total_assets(),
            total_shares: self.ledger.total_supply(),
            dead_shares: self.config.dead_shares,
            scale: self.scale,
        }
    }

    pub fn convert_to_shares(&self, assets: U256) -> Result<U256, VaultError> {
        conversion::shares_for_deposit(assets, &self.totals())
    }

    pub fn convert_to_assets(&self, shares: U256) -> Result<U256, VaultError> {
        conversion::assets_for_redeem(shares, &self.totals())
    }

    pub fn preview_deposit(&self, assets: U256) -> Result<U256, VaultError> {
        conversion::shares_for_deposit(assets, &self.totals())
    }

    pub fn preview_mint(&self, shares: U256) -> Result<U256, VaultError> {
        conversion::assets_for_mint(shares, &self.totals())
    }

    pub fn preview_withdraw(&self, assets: U256) -> Result<U256, VaultError> {
        conversion::shares_for_withdraw(assets, &self.totals())
    }

    pub fn preview_redeem(&self, shares: U256) -> Result<U256, VaultError> {
        conversion::assets_for_redeem(shares, &self.totals())
    }

    /// `U256::MAX` while open, 0 while paused.
    pub fn max_deposit(&self, _receiver: Address) -> U256 {
        if self.pause_guard.is_paused() {
            U256::ZERO
        } else {
            U256::MAX
        }
    }

    /// `U256::MAX` while open, 0 while paused.
    pub fn max_mint(&self, receiver: Address) -> U256 {
        self.max_deposit(receiver)
    }

    /// Assets `owner` can withdraw right now.
    pub fn max_withdraw(&self, owner: Address) -> Result<U256, VaultError> {
        conversion::assets_for_redeem(self.max_redeem(owner), &self.totals())
    }

    /// Shares `owner` can redeem right now. Always 0 for the dead address.
    pub fn max_redeem(&self, owner: Address) -> U256 {
        if owner == self.config.dead_address {
            return U256::ZERO;
        }
        self.ledger.balance_of(&owner)
    }

    /// Base-asset value of one whole share, in whole base-asset units.
    ///
    /// `None` if the value does not fit a `Decimal`.
    pub fn share_price(&self) -> Option<Decimal> {
        let one_share = pow10(self.config.share_decimals).ok()?;
        let assets = conversion::assets_for_redeem(one_share, &self.totals()).ok()?;
        to_decimal(assets, self.config.asset_decimals)
    }

    /// Share ledger and dead-share invariants.
    pub fn invariants_hold(&self) -> bool {
        let dead = self.config.dead_shares;
        self.ledger.is_conserved()
            && self.ledger.total_supply() >= dead
            && self.ledger.balance_of(&self.config.dead_address) == dead
    }

    // ───────────────────────── Share Token Reads ─────────────────────────

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.config.share_decimals
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.ledger.balance_of(&account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.ledger.allowance(&owner, &spender)
    }

    // ───────────────────────── Configuration Reads ─────────────────────────

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Base-asset token address.
    pub fn asset(&self) -> Address {
        self.config.asset_address
    }

    pub fn external_protocol(&self) -> Address {
        self.config.protocol_address
    }

    pub fn vault_address(&self) -> Address {
        self.config.vault_address
    }

    pub fn min_deposit(&self) -> U256 {
        self.config.min_deposit
    }

    pub fn dead_shares(&self) -> U256 {
        self.config.dead_shares
    }

    pub fn dead_address(&self) -> Address {
        self.config.dead_address
    }

    pub fn basis_points(&self) -> u64 {
        BASIS_POINTS
    }

    pub fn slippage_tolerance_bps(&self) -> u64 {
        self.config.slippage_tolerance_bps
    }

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    pub fn is_paused(&self) -> bool {
        self.pause_guard.is_paused()
    }

    pub fn is_emergency_mode(&self) -> bool {
        self.emergency.is_active()
    }

    pub fn base_asset(&self) -> &A {
        &self.asset
    }

    pub fn yield_source(&self) -> &Y {
        &self.protocol
    }

    // ───────────────────────── Deposit / Mint ─────────────────────────

    /// Deposit exactly `assets` of the base asset, minting shares to
    /// `receiver`. Returns the shares minted (floor).
    ///
    /// Emits `Transfer(0 -> receiver)` and `Deposit`.
    pub fn deposit(&mut self, caller: Address, assets: U256, receiver: Address) -> Result<U256, VaultError> {
        self.pause_guard.check_not_paused()?;
        if assets.is_zero() {
            return Ok(U256::ZERO);
        }
        ensure_min_deposit(assets, self.config.min_deposit)?;
        self.ledger.ensure_receivable(&receiver)?;

        let shares = conversion::shares_for_deposit(assets, &self.totals())?;
        debug!(%caller, %assets, %shares, "deposit quoted");
        if shares.is_zero() {
            return Err(VaultError::ZeroShares { assets });
        }
        self.ledger.check_mint(&receiver, shares)?;

        self.pull_and_invest(caller, assets)?;
        self.commit_deposit(caller, receiver, assets, shares)?;
        Ok(shares)
    }

    /// Mint exactly `shares` to `receiver`, charging the caller the asset cost
    /// (ceiling). Returns the assets charged.
    pub fn mint(&mut self, caller: Address, shares: U256, receiver: Address) -> Result<U256, VaultError> {
        self.pause_guard.check_not_paused()?;
        if shares.is_zero() {
            return Ok(U256::ZERO);
        }
        self.ledger.ensure_receivable(&receiver)?;

        let assets = conversion::assets_for_mint(shares, &self.totals())?;
        debug!(%caller, %assets, %shares, "mint quoted");
        ensure_min_deposit(assets, self.config.min_deposit)?;
        self.ledger.check_mint(&receiver, shares)?;

        self.pull_and_invest(caller, assets)?;
        self.commit_deposit(caller, receiver, assets, shares)?;
        Ok(assets)
    }

    /// Pull `assets` from `caller` into custody and forward the whole custody
    /// balance to the yield source.
    ///
    /// If the forward fails the pulled assets go back to the caller. If that
    /// refund fails too, the assets stay in custody, counted by
    /// `total_assets`, and the deposit is committed against them.
    fn pull_and_invest(&mut self, caller: Address, assets: U256) -> Result<(), VaultError> {
        let vault = self.config.vault_address;
        self.asset.transfer_from(vault, caller, vault, assets)?;
        let custody = self.idle_assets();

        let err = match self.protocol.deposit(vault, custody, vault) {
            Ok(external_shares) => {
                debug!(%assets, %custody, %external_shares, "assets forwarded to yield source");
                return Ok(());
            }
            Err(err) => err,
        };
        warn!(%caller, %assets, error = %err, "yield source rejected deposit, refunding");
        match self.asset.transfer(vault, caller, assets) {
            Ok(()) => Err(VaultError::ExternalProtocolCallFailed(err)),
            Err(refund_err) => {
                warn!(%caller, %assets, error = %refund_err, "refund failed, deposit held in custody");
                Ok(())
            }
        }
    }

    fn commit_deposit(
        &mut self,
        caller: Address,
        receiver: Address,
        assets: U256,
        shares: U256,
    ) -> Result<(), VaultError> {
        self.ledger.mint(receiver, shares)?;
        self.events.push(VaultEvent::minted(receiver, shares));
        self.events.push(VaultEvent::Deposit(Deposit {
            caller,
            receiver,
            assets,
            shares,
        }));
        info!(%caller, %receiver, %assets, %shares, "deposit committed");
        Ok(())
    }

    /// Re-deposit base asset sitting in custody back into the yield source.
    pub(crate) fn reinvest(&mut self, assets: U256) -> Result<(), VaultError> {
        if assets.is_zero() {
            return Ok(());
        }
        let vault = self.config.vault_address;
        self.protocol.deposit(vault, assets, vault)?;
        debug!(%assets, "idle assets reinvested");
        Ok(())
    }

    // ───────────────────────── Share Token ─────────────────────────

    pub fn approve(&mut self, owner: Address, spender: Address, value: U256) -> Result<(), VaultError> {
        self.ledger.approve(owner, spender, value)?;
        self.events.push(VaultEvent::Approval(Approval {
            owner,
            spender,
            value,
        }));
        Ok(())
    }

    pub fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), VaultError> {
        self.ledger.transfer(from, to, value)?;
        self.events.push(VaultEvent::Transfer(Transfer { from, to, value }));
        Ok(())
    }

    /// Move `value` shares from `from` to `to`, spending `spender`'s allowance.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<(), VaultError> {
        let previous = self.ledger.spend_allowance(from, spender, value)?;
        if let Err(err) = self.ledger.transfer(from, to, value) {
            self.ledger.restore_allowance(from, spender, previous);
            return Err(err);
        }
        self.events.push(VaultEvent::Transfer(Transfer { from, to, value }));
        Ok(())
    }

    // ───────────────────────── Administration ─────────────────────────

    /// Pause deposits and mints. Owner-only; re-pausing is a no-op.
    pub fn pause(&mut self, caller: Address) -> Result<(), VaultError> {
        self.access.only_owner(&caller)?;
        if self.pause_guard.pause() {
            self.events.push(VaultEvent::Paused { account: caller });
            info!(%caller, "vault paused");
        }
        Ok(())
    }

    /// Resume deposits and mints. Owner-only; unpausing an open vault is a no-op.
    pub fn unpause(&mut self, caller: Address) -> Result<(), VaultError> {
        self.access.only_owner(&caller)?;
        if self.pause_guard.unpause() {
            self.events.push(VaultEvent::Unpaused { account: caller });
            info!(%caller, "vault unpaused");
        }
        Ok(())
    }

    /// Open or close the emergency exit. Owner-only.
    pub fn set_emergency_mode(&mut self, caller: Address, enabled: bool) -> Result<(), VaultError> {
        self.access.only_owner(&caller)?;
        if self.emergency.set(enabled) {
            self.events.push(VaultEvent::EmergencyModeChanged {
                account: caller,
                enabled,
            });
            warn!(%caller, enabled, "emergency mode changed");
        }
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<(), VaultError> {
        let previous_owner = self.access.transfer_ownership(&caller, new_owner)?;
        self.events.push(VaultEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        info!(%previous_owner, %new_owner, "ownership transferred");
        Ok(())
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    /// Drain events (for indexing).
    pub fn drain_events(&mut self) -> Vec<VaultEvent> {
        std::mem::take(&mut self.events)
    }
}
