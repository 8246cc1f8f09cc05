mod common;

use anchor_lang::prelude::*;
use common::{assert_vault_err, Sim, T0};
use compound_vault::{
    error::VaultError,
    instructions::check_work::scan_range,
    state::VaultParams,
    LOCK_PERIOD,
};

const BOOTSTRAP: u64 = 1_000_000_000;

fn deployed(params: VaultParams) -> (Sim, Pubkey) {
    let initializer = Pubkey::new_unique();
    let mut sim = Sim::new(initializer, params);
    sim.fund(initializer, BOOTSTRAP);
    sim.deploy(BOOTSTRAP).unwrap();
    (sim, initializer)
}

#[test]
fn bootstrap_mints_exact_amount_once() {
    let (mut sim, initializer) = deployed(Sim::no_fee());
    assert_eq!(sim.units(&initializer), BOOTSTRAP);
    assert_eq!(sim.vault.total_supply, BOOTSTRAP);
    assert_eq!(sim.vault.initialized_at, T0);
    sim.assert_invariants();

    sim.fund(initializer, BOOTSTRAP);
    assert_vault_err(sim.deploy(BOOTSTRAP), VaultError::AlreadyInitialized);
    assert_eq!(sim.vault.total_supply, BOOTSTRAP);
    assert_eq!(sim.wallet(&initializer), BOOTSTRAP);
}

#[test]
fn bootstrap_requires_registry_caller() {
    let initializer = Pubkey::new_unique();
    let mut sim = Sim::new(initializer, Sim::no_fee());
    let mut h = compound_vault::state::ShareBalance { owner: initializer, ..Default::default() };
    let res = sim.vault.initialize(&Pubkey::new_unique(), &mut h, 5_000, 5_000, T0);
    assert_vault_err(res, VaultError::Unauthorized);
    assert!(!sim.vault.initialized);
}

#[test]
fn bootstrap_below_minimum_is_rejected() {
    let initializer = Pubkey::new_unique();
    let mut sim = Sim::new(initializer, Sim::no_fee());
    sim.fund(initializer, 999);
    assert_vault_err(sim.deploy(999), VaultError::InsufficientInitializationAmount);
    assert_eq!(sim.lp, 0);
    assert_eq!(sim.wallet(&initializer), 999);
    assert!(!sim.vault.initialized);
}

#[test]
fn bootstrap_must_be_backed() {
    let initializer = Pubkey::new_unique();
    let mut sim = Sim::new(initializer, Sim::no_fee());
    let registry = sim.registry;
    let mut h = compound_vault::state::ShareBalance { owner: initializer, ..Default::default() };
    let res = sim.vault.initialize(&registry, &mut h, 2_000, 1_999, T0);
    assert_vault_err(res, VaultError::InsufficientInitializationAmount);
}

#[test]
fn large_stake_keeps_one_to_one_rate() {
    let (mut sim, _) = deployed(Sim::no_fee());
    let alice = Pubkey::new_unique();
    let amount = 1_000_000_000_000_000_000u64;
    sim.fund(alice, amount);
    assert_eq!(sim.stake(alice, amount).unwrap(), amount);
    assert_eq!(sim.units(&alice), amount);
    assert_eq!(sim.vault.total_supply, BOOTSTRAP + amount);
    sim.assert_invariants();
}

#[test]
fn stake_rejects_degenerate_input() {
    let (mut sim, _) = deployed(Sim::no_fee());
    let alice = Pubkey::new_unique();
    sim.fund(alice, 10);
    assert_vault_err(sim.stake(alice, 0), VaultError::ZeroStakeAmount);

    // Grow the rate to 3 LP per unit, so 1 LP mints nothing
    sim.accrue(2 * BOOTSTRAP, 2 * BOOTSTRAP);
    sim.compound().unwrap();
    assert_vault_err(sim.stake(alice, 1), VaultError::ZeroUnitsMinted);
    assert_eq!(sim.wallet(&alice), 10);
    sim.assert_invariants();
}

#[test]
fn stake_before_initialization_fails() {
    let mut sim = Sim::new(Pubkey::new_unique(), Sim::no_fee());
    let alice = Pubkey::new_unique();
    sim.fund(alice, 5_000);
    assert_vault_err(sim.stake(alice, 5_000), VaultError::VaultNotInitialized);
}

#[test]
fn exit_after_rewards_pays_more_than_principal() {
    let (mut sim, _) = deployed(Sim::no_fee());
    let alice = Pubkey::new_unique();
    sim.fund(alice, 500_000_000);
    let units = sim.stake(alice, 500_000_000).unwrap();

    sim.accrue(300_000_000, 300_000_000);
    let pre_compound_share = units as u128 * sim.lp as u128 / sim.vault.total_supply as u128;
    let supply_before = sim.vault.total_supply;

    let paid = sim.exit(alice).unwrap();
    assert!(paid as u128 > pre_compound_share, "paid {paid} ≤ {pre_compound_share}");
    assert_eq!(paid, 600_000_000);
    assert_eq!(sim.vault.total_supply, supply_before - units);
    assert_eq!(sim.units(&alice), 0);
    sim.assert_invariants();
}

#[test]
fn exit_with_nothing_staked_fails() {
    let (mut sim, _) = deployed(Sim::no_fee());
    assert_vault_err(sim.exit(Pubkey::new_unique()), VaultError::ZeroUnitsBurned);
}

#[test]
fn exit_failure_rolls_back_compound() {
    let (mut sim, _) = deployed(Sim::no_fee());
    sim.accrue(10, 10);
    assert_vault_err(sim.exit(Pubkey::new_unique()), VaultError::ZeroUnitsBurned);
    assert_eq!((sim.reward_a, sim.reward_b), (10, 10));
    assert_eq!(sim.vault.last_compounded_at, 0);
}

#[test]
fn withdraw_is_proportional_and_does_not_compound() {
    let (mut sim, _) = deployed(Sim::no_fee());
    let bob = Pubkey::new_unique();
    sim.fund(bob, BOOTSTRAP);
    sim.stake(bob, BOOTSTRAP).unwrap();
    sim.accrue(50, 50);

    let paid = sim.withdraw(bob, BOOTSTRAP / 2).unwrap();
    assert_eq!(paid, BOOTSTRAP / 2);
    assert_eq!((sim.reward_a, sim.reward_b), (50, 50));
    assert_vault_err(sim.withdraw(bob, 0), VaultError::ZeroUnitsBurned);
    assert_vault_err(sim.withdraw(bob, BOOTSTRAP), VaultError::InsufficientUnits);
    sim.assert_invariants();
}

#[test]
fn fee_is_two_percent_of_new_liquidity() {
    let (mut sim, _) = deployed(Sim::fee(200));
    let lp_before = sim.lp;
    sim.accrue(100, 100);
    let cut = sim.compound().unwrap().expect("compound should run");
    assert_eq!((cut.fee, cut.net), (2, 98));
    assert_eq!(sim.fee_wallet, 2);
    assert_eq!(sim.lp, lp_before + 98);
    sim.assert_invariants();
}

#[test]
fn compound_with_one_empty_leg_is_noop() {
    let (mut sim, _) = deployed(Sim::fee(200));
    sim.accrue(100, 0);
    sim.advance(10);
    assert_eq!(sim.compound().unwrap(), None);
    assert_eq!(sim.vault.last_compounded_at, 0);
    assert_eq!(sim.reward_a, 100);
}

#[test]
fn repeated_compound_is_idempotent() {
    let (mut sim, _) = deployed(Sim::no_fee());
    sim.accrue(40, 40);
    assert!(sim.compound().unwrap().is_some());
    let lp = sim.lp;
    let stamp = sim.vault.last_compounded_at;
    sim.advance(5);
    assert_eq!(sim.compound().unwrap(), None);
    assert_eq!(sim.lp, lp);
    assert_eq!(sim.vault.last_compounded_at, stamp);
}

#[test]
fn initializer_lock_expires_exactly_at_unlock_time() {
    let (mut sim, initializer) = deployed(Sim::no_fee());
    let carol = Pubkey::new_unique();

    assert_vault_err(sim.transfer(initializer, carol, 1), VaultError::InitializerLocked);
    assert_vault_err(sim.withdraw(initializer, 1), VaultError::InitializerLocked);

    sim.advance(LOCK_PERIOD - 1);
    assert_vault_err(sim.transfer(initializer, carol, 1), VaultError::InitializerLocked);

    sim.advance(1);
    assert_eq!(sim.now, sim.unlock_at());
    sim.transfer(initializer, carol, 1).unwrap();
    sim.withdraw(initializer, 1).unwrap();
    assert_eq!(sim.units(&carol), 1);
    sim.assert_invariants();
}

#[test]
fn lock_does_not_apply_to_inbound_units() {
    let (mut sim, initializer) = deployed(Sim::no_fee());
    let dave = Pubkey::new_unique();
    sim.fund(dave, 10_000);
    sim.stake(dave, 10_000).unwrap();
    sim.transfer(dave, initializer, 500).unwrap();
    assert_eq!(sim.units(&initializer), BOOTSTRAP + 500);
    assert_vault_err(sim.transfer(initializer, dave, 500), VaultError::InitializerLocked);
}

#[test]
fn self_transfer_is_rejected() {
    let (mut sim, _) = deployed(Sim::no_fee());
    let erin = Pubkey::new_unique();
    sim.fund(erin, 5_000);
    sim.stake(erin, 5_000).unwrap();
    assert_vault_err(sim.transfer(erin, erin, 1), VaultError::SelfTransfer);
    assert_eq!(sim.units(&erin), 5_000);
}

#[test]
fn params_reject_excessive_fee_and_foreign_caller() {
    let (mut sim, _) = deployed(Sim::no_fee());
    let registry = sim.registry;
    assert_vault_err(
        sim.vault.apply_params(&registry, &Sim::fee(1_001)),
        VaultError::ExcessiveFeeValue,
    );
    assert_vault_err(
        sim.vault.apply_params(&Pubkey::new_unique(), &Sim::fee(100)),
        VaultError::Unauthorized,
    );
    let negative = VaultParams { automation_interval: -1, ..Sim::no_fee() };
    assert_vault_err(
        sim.vault.apply_params(&registry, &negative),
        VaultError::InvalidAutomationInterval,
    );
    sim.vault.apply_params(&registry, &Sim::fee(1_000)).unwrap();
    assert_eq!(sim.vault.params.fee_rate_bps, 1_000);
}

fn check_work(vaults: &[Sim], start: u64, end: u64) -> (bool, Vec<u8>) {
    let end = end.min(vaults.len() as u64);
    let r = scan_range(start, end, |i| {
        let v = &vaults[i as usize];
        Ok(v.needs_compounding().then_some(v.vault.lp_mint))
    })
    .unwrap();
    (r.upkeep_needed, r.perform_data)
}

#[test]
fn check_work_follows_interval_and_rewards() {
    let interval = 3_600;
    let params = VaultParams { automation_interval: interval, ..Sim::no_fee() };
    let mut vaults: Vec<Sim> = (0..3).map(|_| deployed(params).0).collect();

    // Fresh vaults without rewards need nothing
    assert_eq!(check_work(&vaults, 0, 3), (false, vec![]));

    vaults[1].accrue(100, 100);
    vaults[1].compound().unwrap();
    vaults[1].accrue(7, 7);
    assert_eq!(check_work(&vaults, 0, 3).0, false);

    // Interval must be strictly exceeded
    vaults[1].advance(interval);
    assert_eq!(check_work(&vaults, 0, 3).0, false);
    vaults[1].advance(1);
    let (needed, data) = check_work(&vaults, 0, 3);
    assert!(needed);
    assert_eq!(data, vaults[1].vault.lp_mint.to_bytes().to_vec());

    // Out-of-range and empty windows
    assert_eq!(check_work(&vaults, 2, 3).0, false);
    assert_eq!(check_work(&vaults, 1, 1).0, false);
    assert!(check_work(&vaults, 1, 99).0);

    // Dispatch clears it
    vaults[1].compound().unwrap();
    assert_eq!(check_work(&vaults, 0, 3).0, false);
}

#[test]
fn check_work_reports_lowest_index_first() {
    let mut vaults: Vec<Sim> = (0..4).map(|_| deployed(Sim::no_fee()).0).collect();
    for v in vaults.iter_mut().skip(1) {
        v.accrue(5, 5);
        v.advance(1);
    }
    let (_, data) = check_work(&vaults, 0, 4);
    assert_eq!(data, vaults[1].vault.lp_mint.to_bytes().to_vec());
    let (_, data) = check_work(&vaults, 2, 4);
    assert_eq!(data, vaults[2].vault.lp_mint.to_bytes().to_vec());
}
