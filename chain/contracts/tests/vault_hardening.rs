//! Vault Hardening Tests
//!
//! End-to-end checks of the vault against in-memory collaborators:
//! - Reference deposit/redeem scenario
//! - Share floor and conservation
//! - Zero-amount no-ops and entitlement boundaries
//! - Pause scoping and emergency gating
//! - Slippage and external-failure atomicity
//! - Inflation attack and dead-address lock
//! - Delegated redemption
//! - Fuzz testing (proptest)

use alloy_primitives::{Address, U256};
use contracts::events::VaultEvent;
use contracts::{VaultConfig, VaultError, VAULT_INTERFACE_VERSION};
use simulation::world::VaultWorld;
use tracing_subscriber::EnvFilter;
use types::errors::ProtocolError;

const USDC: u64 = 1_000_000;
const ONE_SHARE: u128 = 1_000_000_000_000_000_000;

// ═══════════════════════════════════════════════════════════════════
// Reference Scenario
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_reference_deposit_and_full_exit() {
    init_tracing();
    let mut world = setup_world(1, 100);
    let user = world.user(0);

    assert_eq!(world.vault.total_supply(), U256::from(1_000u64));

    let shares = world.vault.deposit(user, usdc(100), user).unwrap();
    assert_eq!(shares, U256::from(100 * ONE_SHARE));
    assert_eq!(world.vault.total_supply(), U256::from(100 * ONE_SHARE + 1_000));

    let over = world.vault.redeem(user, shares + U256::from(1u64), user, user);
    assert!(matches!(over, Err(VaultError::ExceededMaxRedeem { .. })));

    world.protocol.set_redeem_haircut_bps(50);
    let paid = world.vault.redeem(user, shares, user, user).unwrap();
    assert!(paid >= U256::from(99_500_000u64) && paid <= usdc(100));
    assert_eq!(world.token.balance(user), paid);
    assert_eq!(world.vault.total_supply(), U256::from(1_000u64));
    assert!(world.check_invariants().is_ok());
}

#[test]
fn test_reference_event_sequence() {
    let mut world = setup_world(1, 100);
    let user = world.user(0);
    world.vault.drain_events();

    let shares = world.vault.deposit(user, usdc(100), user).unwrap();
    world.vault.redeem(user, shares, user, user).unwrap();

    let kinds: Vec<&str> = world
        .vault
        .events()
        .iter()
        .map(|event| match event {
            VaultEvent::Transfer(_) => "Transfer",
            VaultEvent::Deposit(_) => "Deposit",
            VaultEvent::SharesBurned(_) => "SharesBurned",
            VaultEvent::RedemptionInitiated(_) => "RedemptionInitiated",
            VaultEvent::RedemptionSettled(_) => "RedemptionSettled",
            VaultEvent::Withdraw(_) => "Withdraw",
            _ => "Other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "Transfer",
            "Deposit",
            "SharesBurned",
            "Transfer",
            "RedemptionInitiated",
            "RedemptionSettled",
            "Withdraw",
        ]
    );

    let json = serde_json::to_string(world.vault.events()).unwrap();
    let back: Vec<VaultEvent> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.as_slice(), world.vault.events());
}

// ═══════════════════════════════════════════════════════════════════
// Share Floor & Round Trip
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_dead_shares_survive_full_exit() {
    let mut world = setup_world(2, 1_000);
    let (alice, bob) = (world.user(0), world.user(1));
    let a = world.vault.deposit(alice, usdc(300), alice).unwrap();
    let b = world.vault.deposit(bob, usdc(700), bob).unwrap();

    world.vault.redeem(alice, a, alice, alice).unwrap();
    world.vault.redeem(bob, b, bob, bob).unwrap();

    let dead = world.vault.dead_address();
    assert_eq!(world.vault.total_supply(), world.vault.dead_shares());
    assert_eq!(world.vault.balance_of(dead), world.vault.dead_shares());
    assert!(world.check_invariants().is_ok());
}

#[test]
fn test_round_trip_never_profits() {
    let mut world = setup_world(2, 1_000);
    let (alice, bob) = (world.user(0), world.user(1));
    world.vault.deposit(alice, usdc(333), alice).unwrap();
    world.protocol.accrue_yield(U256::from(7_777_777u64)).unwrap();

    let shares = world.vault.deposit(bob, U256::from(12_345_678u64), bob).unwrap();
    let paid = world.vault.redeem(bob, shares, bob, bob).unwrap();
    assert!(paid <= U256::from(12_345_678u64));
}

#[test]
fn test_yield_accrues_to_holders() {
    let mut world = setup_world(1, 100);
    let user = world.user(0);
    let shares = world.vault.deposit(user, usdc(100), user).unwrap();
    world.protocol.accrue_yield(usdc(5)).unwrap();

    // Dead shares hold no claim: the single user owns the yield, less one
    // unit of rounding against the virtual offset
    let value = world.vault.preview_redeem(shares).unwrap();
    assert!(value <= usdc(105));
    assert!(usdc(105) - value <= U256::from(1u64));
}

// ═══════════════════════════════════════════════════════════════════
// Zero Amounts & Entitlement
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_zero_amounts_are_noops() {
    let mut world = setup_world(1, 100);
    let user = world.user(0);
    world.vault.deposit(user, usdc(10), user).unwrap();
    let events_before = world.vault.events().len();
    let balance_before = world.vault.balance_of(user);

    assert_eq!(world.vault.deposit(user, U256::ZERO, user).unwrap(), U256::ZERO);
    assert_eq!(world.vault.mint(user, U256::ZERO, user).unwrap(), U256::ZERO);
    assert_eq!(world.vault.withdraw(user, U256::ZERO, user, user).unwrap(), U256::ZERO);
    assert_eq!(world.vault.redeem(user, U256::ZERO, user, user).unwrap(), U256::ZERO);

    assert_eq!(world.vault.events().len(), events_before);
    assert_eq!(world.vault.balance_of(user), balance_before);
}

#[test]
fn test_withdraw_max_succeeds_max_plus_one_fails() {
    let mut world = setup_world(1, 100);
    let user = world.user(0);
    world.vault.deposit(user, usdc(100), user).unwrap();
    world.protocol.accrue_yield(U256::from(1_234_567u64)).unwrap();

    let max = world.vault.max_withdraw(user).unwrap();
    let result = world.vault.withdraw(user, max + U256::from(1u64), user, user);
    assert!(matches!(result, Err(VaultError::ExceededMaxWithdraw { .. })));

    world.vault.withdraw(user, max, user, user).unwrap();
    assert_eq!(world.token.balance(user), max);
}

#[test]
fn test_below_minimum_deposit() {
    let mut world = setup_world(1, 100);
    let user = world.user(0);
    let result = world.vault.deposit(user, U256::from(USDC - 1), user);
    assert_eq!(
        result,
        Err(VaultError::BelowMinimumDeposit {
            assets: U256::from(USDC - 1),
            minimum: U256::from(USDC),
        })
    );
    assert!(world.vault.deposit(user, U256::from(USDC), user).is_ok());
}

// ═══════════════════════════════════════════════════════════════════
// Pause & Emergency
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_pause_blocks_deposits_not_exits() {
    let mut world = setup_world(1, 100);
    let user = world.user(0);
    let owner = world.owner;
    let shares = world.vault.deposit(user, usdc(50), user).unwrap();

    world.vault.pause(owner).unwrap();
    assert!(world.vault.is_paused());
    assert_eq!(world.vault.deposit(user, usdc(10), user), Err(VaultError::VaultPaused));
    assert_eq!(world.vault.mint(user, U256::from(ONE_SHARE), user), Err(VaultError::VaultPaused));

    let half = shares / U256::from(2u8);
    assert!(world.vault.redeem(user, half, user, user).is_ok());
    assert!(world.vault.withdraw(user, usdc(10), user, user).is_ok());

    world.vault.unpause(owner).unwrap();
    assert!(world.vault.deposit(user, usdc(10), user).is_ok());
}

#[test]
fn test_only_owner_toggles_pause() {
    let mut world = setup_world(1, 100);
    let user = world.user(0);
    assert_eq!(world.vault.pause(user), Err(VaultError::Unauthorized { caller: user }));
    assert!(!world.vault.is_paused());
}

#[test]
fn test_pause_events_not_duplicated() {
    let mut world = setup_world(1, 100);
    let owner = world.owner;
    world.vault.drain_events();

    world.vault.pause(owner).unwrap();
    world.vault.pause(owner).unwrap();
    world.vault.unpause(owner).unwrap();
    world.vault.unpause(owner).unwrap();

    assert_eq!(
        world.vault.events(),
        &[
            VaultEvent::Paused { account: owner },
            VaultEvent::Unpaused { account: owner },
        ]
    );
}

#[test]
fn test_emergency_exit_gated_and_unchecked() {
    let mut world = setup_world(1, 100);
    let user = world.user(0);
    let owner = world.owner;
    let shares = world.vault.deposit(user, usdc(100), user).unwrap();
    world.protocol.set_redeem_haircut_bps(300);

    assert_eq!(
        world.vault.emergency_withdraw(user, shares, user),
        Err(VaultError::EmergencyModeInactive)
    );
    // Regular exit refuses the haircut
    assert!(matches!(
        world.vault.redeem(user, shares, user, user),
        Err(VaultError::SlippageExceeded { .. })
    ));

    world.vault.set_emergency_mode(owner, true).unwrap();
    assert!(world.vault.is_emergency_mode());
    let paid = world.vault.emergency_withdraw(user, shares, user).unwrap();
    assert_eq!(paid, usdc(97));
    assert!(world.check_invariants().is_ok());
}

// ═══════════════════════════════════════════════════════════════════
// Atomicity
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_slippage_failure_is_bit_identical() {
    let mut world = setup_world(2, 100);
    let (alice, bob) = (world.user(0), world.user(1));
    world.vault.deposit(alice, usdc(60), alice).unwrap();
    world.vault.deposit(bob, usdc(40), bob).unwrap();
    world.vault.drain_events();

    let alice_before = world.vault.balance_of(alice);
    let bob_before = world.vault.balance_of(bob);
    let supply_before = world.vault.total_supply();

    world.protocol.set_redeem_haircut_bps(150);
    let result = world.vault.redeem(alice, alice_before, alice, alice);
    assert!(matches!(result, Err(VaultError::SlippageExceeded { .. })));

    assert_eq!(world.vault.balance_of(alice), alice_before);
    assert_eq!(world.vault.balance_of(bob), bob_before);
    assert_eq!(world.vault.total_supply(), supply_before);
    assert!(world.vault.events().is_empty());
    assert!(world.check_invariants().is_ok());
}

#[test]
fn test_illiquid_protocol_rolls_back() {
    let mut world = setup_world(1, 100);
    let user = world.user(0);
    let shares = world.vault.deposit(user, usdc(100), user).unwrap();
    world.protocol.set_liquidity(Some(usdc(10)));

    let result = world.vault.redeem(user, shares, user, user);
    assert!(matches!(
        result,
        Err(VaultError::ExternalProtocolCallFailed(ProtocolError::InsufficientLiquidity { .. }))
    ));
    assert_eq!(world.vault.balance_of(user), shares);

    // Partial exits within liquidity still work
    world.vault.withdraw(user, usdc(5), user, user).unwrap();
}

#[test]
fn test_payout_failure_rolls_back() {
    let mut world = setup_world(1, 100);
    let user = world.user(0);
    let shares = world.vault.deposit(user, usdc(100), user).unwrap();
    let blocked = Address::repeat_byte(0xee);
    world.token.set_blocked(blocked, true);

    let result = world.vault.redeem(user, shares, blocked, user);
    assert!(matches!(result, Err(VaultError::InvalidReceiver { .. })));
    assert_eq!(world.vault.balance_of(user), shares);
    assert_eq!(world.vault.total_assets(), usdc(100));
    assert!(world.check_invariants().is_ok());
}

#[test]
fn test_failed_redeposit_keeps_assets_in_accounting() {
    let mut world = setup_world(2, 100);
    let (alice, bob) = (world.user(0), world.user(1));
    let alice_shares = world.vault.deposit(alice, usdc(100), alice).unwrap();
    let bob_shares = world.vault.deposit(bob, usdc(100), bob).unwrap();
    let total_before = world.vault.total_assets();

    world.protocol.set_redeem_haircut_bps(100);
    world.protocol.fail_deposits(true);
    let result = world.vault.redeem(alice, alice_shares, alice, alice);
    assert!(matches!(result, Err(VaultError::SlippageExceeded { .. })));

    // Redeemed assets could not go back in: they stay in custody, counted
    assert_eq!(world.vault.balance_of(alice), alice_shares);
    assert_eq!(world.vault.idle_assets(), U256::from(99_495_000u64));
    assert_eq!(world.vault.total_assets(), total_before);
    assert!(world.check_invariants().is_ok());

    // Bob's position is still fully backed, paid from custody first
    world.protocol.set_redeem_haircut_bps(0);
    let paid = world.vault.redeem(bob, bob_shares, bob, bob).unwrap();
    assert_eq!(paid, usdc(100));
    assert!(world.check_invariants().is_ok());

    // The next deposit sweeps custody back into the yield source
    world.protocol.fail_deposits(false);
    world.vault.deposit(bob, usdc(10), bob).unwrap();
    assert_eq!(world.vault.idle_assets(), U256::ZERO);

    let paid = world.vault.redeem(alice, alice_shares, alice, alice).unwrap();
    assert_eq!(paid, usdc(100));
    assert!(world.check_invariants().is_ok());
}

#[test]
fn test_emergency_exit_takes_share_of_custody() {
    let mut world = setup_world(2, 100);
    let (alice, bob) = (world.user(0), world.user(1));
    let owner = world.owner;
    let alice_shares = world.vault.deposit(alice, usdc(100), alice).unwrap();
    world.vault.deposit(bob, usdc(100), bob).unwrap();

    world.protocol.set_redeem_haircut_bps(100);
    world.protocol.fail_deposits(true);
    assert!(world.vault.redeem(alice, alice_shares, alice, alice).is_err());
    world.protocol.set_redeem_haircut_bps(0);

    world.vault.set_emergency_mode(owner, true).unwrap();
    let paid = world.vault.emergency_withdraw(alice, alice_shares, alice).unwrap();
    assert_eq!(paid, usdc(100));
    assert_eq!(world.vault.max_withdraw(bob).unwrap(), usdc(100));
    assert!(world.check_invariants().is_ok());
}

#[test]
fn test_failed_forward_leaves_no_trace() {
    let mut world = setup_world(1, 100);
    let user = world.user(0);
    world.protocol.fail_deposits(true);
    world.vault.drain_events();

    let result = world.vault.deposit(user, usdc(10), user);
    assert!(matches!(result, Err(VaultError::ExternalProtocolCallFailed(_))));
    assert_eq!(world.token.balance(user), usdc(100));
    assert_eq!(world.vault.total_supply(), world.vault.dead_shares());
    assert!(world.vault.events().is_empty());
}

// ═══════════════════════════════════════════════════════════════════
// Manipulation Resistance
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_donation_before_first_deposit_is_captured_by_depositor() {
    let mut world = setup_world(2, 20_000);
    let (attacker, victim) = (world.user(0), world.user(1));

    // Donation with no user shares outstanding does not set the price
    world.donate(attacker, usdc(10_000)).unwrap();
    let shares = world.vault.deposit(victim, usdc(100), victim).unwrap();
    assert_eq!(shares, U256::from(100 * ONE_SHARE));
    assert!(world.vault.preview_redeem(shares).unwrap() >= usdc(100));
}

#[test]
fn test_inflation_after_minimal_deposit_costs_victim_nothing() {
    let mut world = setup_world(2, 20_000);
    let (attacker, victim) = (world.user(0), world.user(1));
    world.vault.deposit(attacker, usdc(1), attacker).unwrap();
    world.donate(attacker, usdc(10_000)).unwrap();

    let shares = world.vault.deposit(victim, usdc(100), victim).unwrap();
    assert!(!shares.is_zero());
    let value = world.vault.preview_redeem(shares).unwrap();
    assert!(usdc(100) - value <= U256::from(1u64));
}

#[test]
fn test_inflation_after_shrinking_supply_to_one_unit() {
    let mut world = setup_world(2, 30_000);
    let (attacker, victim) = (world.user(0), world.user(1));
    let attacker_start = world.token.balance(attacker);

    // Attacker leaves a single live share unit behind a near-empty vault
    let shares = world.vault.deposit(attacker, usdc(1), attacker).unwrap();
    world
        .vault
        .redeem(attacker, shares - U256::from(1u64), attacker, attacker)
        .unwrap();
    assert_eq!(world.vault.balance_of(attacker), U256::from(1u64));
    assert_eq!(world.vault.total_supply(), U256::from(1_001u64));

    world.donate(attacker, usdc(10_000)).unwrap();
    let victim_shares = world.vault.deposit(victim, usdc(15_000), victim).unwrap();
    let value = world.vault.preview_redeem(victim_shares).unwrap();
    assert!(usdc(15_000) - value <= U256::from(1u64));

    // The residual unit is worth nothing; the donation is not recoverable
    assert_eq!(
        world.vault.redeem(attacker, U256::from(1u64), attacker, attacker),
        Err(VaultError::ZeroAssets { shares: U256::from(1u64) })
    );
    assert!(world.token.balance(attacker) < attacker_start);

    let paid = world.vault.redeem(victim, victim_shares, victim, victim).unwrap();
    assert!(usdc(15_000) - paid <= U256::from(1u64));
    assert!(world.check_invariants().is_ok());
}

#[test]
fn test_dead_address_locked() {
    let mut world = setup_world(1, 100);
    let user = world.user(0);
    let dead = world.vault.dead_address();
    world.vault.deposit(user, usdc(10), user).unwrap();

    assert_eq!(
        world.vault.transfer(dead, user, U256::from(1u64)),
        Err(VaultError::DeadSharesLocked)
    );
    assert!(matches!(
        world.vault.transfer(user, dead, U256::from(1u64)),
        Err(VaultError::InvalidReceiver { .. })
    ));
    assert_eq!(world.vault.max_redeem(dead), U256::ZERO);
    assert_eq!(world.vault.balance_of(dead), world.vault.dead_shares());
}

// ═══════════════════════════════════════════════════════════════════
// Delegation
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_withdraw_on_behalf_needs_allowance() {
    let mut world = setup_world(2, 100);
    let (alice, bob) = (world.user(0), world.user(1));
    world.vault.deposit(alice, usdc(100), alice).unwrap();

    let result = world.vault.withdraw(bob, usdc(10), bob, alice);
    assert!(matches!(result, Err(VaultError::InsufficientAllowance { .. })));

    world.vault.approve(alice, bob, U256::MAX).unwrap();
    let burned = world.vault.withdraw(bob, usdc(10), bob, alice).unwrap();
    assert_eq!(burned, U256::from(10 * ONE_SHARE));
    assert_eq!(world.token.balance(bob), usdc(110));
    assert_eq!(world.vault.allowance(alice, bob), U256::MAX);
}

#[test]
fn test_interface_version_frozen() {
    assert_eq!(VAULT_INTERFACE_VERSION, "1.0.0");
}

#[test]
fn test_custom_config_world() {
    let config = VaultConfig {
        min_deposit: U256::from(10u64 * USDC),
        dead_shares: U256::from(1_000_000u64),
        ..VaultConfig::default()
    };
    let mut world = VaultWorld::new(config, 1, usdc(100)).unwrap();
    let user = world.user(0);
    assert!(matches!(
        world.vault.deposit(user, usdc(5), user),
        Err(VaultError::BelowMinimumDeposit { .. })
    ));
    assert_eq!(world.vault.total_supply(), U256::from(1_000_000u64));
}

// ═══════════════════════════════════════════════════════════════════
// Fuzz Testing (proptest)
// ═══════════════════════════════════════════════════════════════════

mod fuzz {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Deposit { user: usize, whole: u64 },
        Redeem { user: usize, fraction: u8 },
        Withdraw { user: usize, whole: u64 },
        Transfer { from: usize, to: usize },
        Yield { units: u64 },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..3usize, 1..=200u64).prop_map(|(user, whole)| Op::Deposit { user, whole }),
            (0..3usize, 1..=4u8).prop_map(|(user, fraction)| Op::Redeem { user, fraction }),
            (0..3usize, 1..=50u64).prop_map(|(user, whole)| Op::Withdraw { user, whole }),
            (0..3usize, 0..3usize).prop_map(|(from, to)| Op::Transfer { from, to }),
            (0..=5_000_000u64).prop_map(|units| Op::Yield { units }),
        ]
    }

    fn apply(world: &mut VaultWorld, op: &Op) {
        let _ = match *op {
            Op::Deposit { user, whole } => {
                let user = world.user(user);
                world.vault.deposit(user, usdc(whole), user).map(|_| ())
            }
            Op::Redeem { user, fraction } => {
                let user = world.user(user);
                let shares = world.vault.balance_of(user) / U256::from(fraction);
                world.vault.redeem(user, shares, user, user).map(|_| ())
            }
            Op::Withdraw { user, whole } => {
                let user = world.user(user);
                world.vault.withdraw(user, usdc(whole), user, user).map(|_| ())
            }
            Op::Transfer { from, to } => {
                let (from, to) = (world.user(from), world.user(to));
                let shares = world.vault.balance_of(from) / U256::from(3u8);
                world.vault.transfer(from, to, shares)
            }
            Op::Yield { units } => {
                world.protocol.accrue_yield(U256::from(units)).unwrap();
                Ok(())
            }
        };
    }

    proptest! {
        /// Σ balances == total_shares and the dead balance never moves.
        #[test]
        fn fuzz_conservation_and_share_floor(ops in prop::collection::vec(op(), 1..40)) {
            let mut world = setup_world(3, 5_000);
            for op in &ops {
                apply(&mut world, op);
                prop_assert!(world.vault.invariants_hold());
                prop_assert!(world.vault.total_supply() >= world.vault.dead_shares());
                prop_assert!(world.check_invariants().is_ok());
            }
        }

        /// A fresh deposit redeemed immediately never returns more than it cost.
        #[test]
        fn fuzz_round_trip(
            ops in prop::collection::vec(op(), 0..20),
            assets in 1_000_000u64..=1_000_000_000u64,
        ) {
            let mut world = setup_world(3, 5_000);
            for op in &ops {
                apply(&mut world, op);
            }
            let newcomer = Address::repeat_byte(0x99);
            world.fund(newcomer, U256::from(assets)).unwrap();

            if let Ok(shares) = world.vault.deposit(newcomer, U256::from(assets), newcomer) {
                let quoted = world.vault.preview_redeem(shares).unwrap();
                prop_assert!(quoted <= U256::from(assets));
                if let Ok(paid) = world.vault.redeem(newcomer, shares, newcomer, newcomer) {
                    prop_assert!(paid <= U256::from(assets));
                }
            }
        }

        /// Redeeming more than the balance always fails and changes nothing.
        #[test]
        fn fuzz_cannot_redeem_more_than_balance(
            whole in 1u64..=1_000u64,
            extra in 1u64..=u64::MAX,
        ) {
            let mut world = setup_world(1, 1_000);
            let user = world.user(0);
            let shares = world.vault.deposit(user, usdc(whole), user).unwrap();
            let result = world.vault.redeem(user, shares + U256::from(extra), user, user);
            let is_exceeded = matches!(result, Err(VaultError::ExceededMaxRedeem { .. }));
            prop_assert!(is_exceeded);
            prop_assert_eq!(world.vault.balance_of(user), shares);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn usdc(whole: u64) -> U256 {
    U256::from(whole) * U256::from(USDC)
}

fn setup_world(users: usize, funding_whole: u64) -> VaultWorld {
    VaultWorld::with_defaults(users, usdc(funding_whole)).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
