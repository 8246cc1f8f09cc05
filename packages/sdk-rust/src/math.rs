//! Vault accounting math.
//!
//! Mirrors the on-chain arithmetic exactly so off-chain estimates match on-chain results.

use crate::error::{Error, Result};
use crate::state::VaultState;

// ─── Constants ────────────────────────────────────────────────────────────────

/// Initializer units stay transfer-locked this long after bootstrap.
pub const LOCK_PERIOD: i64 = 7 * 24 * 60 * 60;
/// Smallest LP amount a vault can be bootstrapped with.
pub const MIN_INITIALIZATION_AMOUNT: u64 = 1_000;
/// Compounding fee cap (10%).
pub const MAX_FEE_BPS: u16 = 1_000;
/// Basis-point denominator.
pub const BPS_DENOMINATOR: u128 = 10_000;

// ─── Stake / withdraw ─────────────────────────────────────────────────────────

/// Units minted for `amount` LP against the pre-deposit `pool_balance`.
pub fn units_for_deposit(amount: u64, total_supply: u64, pool_balance: u64) -> Result<u64> {
    if total_supply == 0 {
        return Ok(amount);
    }
    if pool_balance == 0 {
        return Ok(0);
    }
    let units = (amount as u128)
        .checked_mul(total_supply as u128)
        .ok_or(Error::MathOverflow)?
        / pool_balance as u128;
    u64::try_from(units).map_err(|_| Error::MathOverflow)
}

/// LP paid for burning `units`.
pub fn assets_for_units(units: u64, pool_balance: u64, total_supply: u64) -> Result<u64> {
    if total_supply == 0 {
        return Ok(0);
    }
    let assets = (units as u128)
        .checked_mul(pool_balance as u128)
        .ok_or(Error::MathOverflow)?
        / total_supply as u128;
    u64::try_from(assets).map_err(|_| Error::MathOverflow)
}

// ─── Compounding ──────────────────────────────────────────────────────────────

/// `(fee, net)` split of freshly minted liquidity.
pub fn split_fee(liquidity: u64, fee_enabled: bool, fee_rate_bps: u16) -> (u64, u64) {
    if !fee_enabled || fee_rate_bps == 0 {
        return (0, liquidity);
    }
    let rate = fee_rate_bps.min(MAX_FEE_BPS) as u128;
    let fee = (liquidity as u128 * rate / BPS_DENOMINATOR) as u64;
    (fee, liquidity - fee)
}

/// Same predicate the program's `check_work` applies per vault.
pub fn needs_compounding(vault: &VaultState, reward_a: u64, reward_b: u64, now: i64) -> bool {
    reward_a > 0
        && reward_b > 0
        && (now as i128) - (vault.last_compounded_at as i128) > vault.automation_interval as i128
}

/// Timestamp at which the initializer's units become transferable.
pub fn unlock_at(vault: &VaultState) -> i64 {
    vault.initialized_at.saturating_add(LOCK_PERIOD)
}

/// Whether `owner`'s units are still under the initializer lock.
pub fn is_locked(vault: &VaultState, owner: &solana_sdk::pubkey::Pubkey, now: i64) -> bool {
    vault.initialized && *owner == vault.initializer && now < unlock_at(vault)
}

/// LP redeemable per unit.
pub fn redemption_rate(lp_balance: u64, total_supply: u64) -> f64 {
    if total_supply == 0 {
        return 0.0;
    }
    lp_balance as f64 / total_supply as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::pubkey::Pubkey;

    fn vault(last: i64, interval: i64) -> VaultState {
        VaultState {
            registry:            Pubkey::default(),
            index:               0,
            lp_mint:             Pubkey::default(),
            reward_a_mint:       Pubkey::default(),
            reward_b_mint:       Pubkey::default(),
            router_program:      Pubkey::default(),
            router_pool:         Pubkey::default(),
            lp_account:          Pubkey::default(),
            reward_a_account:    Pubkey::default(),
            reward_b_account:    Pubkey::default(),
            initializer:         Pubkey::new_unique(),
            initialized_at:      1_000,
            initialized:         true,
            total_supply:        0,
            fee_recipient:       Pubkey::default(),
            fee_enabled:         false,
            fee_rate_bps:        0,
            automation_interval: interval,
            last_compounded_at:  last,
            symbol:              String::new(),
        }
    }

    #[test]
    fn deposit_and_redeem_mirror_program() {
        assert_eq!(units_for_deposit(500, 0, 0).unwrap(), 500);
        assert_eq!(units_for_deposit(500, 1_000, 2_000).unwrap(), 250);
        assert_eq!(units_for_deposit(1, 1_000, 3_000).unwrap(), 0);
        assert_eq!(assets_for_units(250, 2_500, 1_250).unwrap(), 500);
        assert!(units_for_deposit(u64::MAX, u64::MAX, 1).is_err());
    }

    #[test]
    fn fee_split_matches_program() {
        assert_eq!(split_fee(100, true, 200), (2, 98));
        assert_eq!(split_fee(100, false, 200), (0, 100));
        assert_eq!(split_fee(0, true, 1_000), (0, 0));
    }

    #[test]
    fn compounding_predicate() {
        let v = vault(100, 50);
        assert!(!needs_compounding(&v, 1, 1, 150));
        assert!(needs_compounding(&v, 1, 1, 151));
        assert!(!needs_compounding(&v, 0, 1, 151));
        assert!(!needs_compounding(&v, 1, 0, 151));
    }

    #[test]
    fn lock_window_is_half_open() {
        let v = vault(0, 0);
        let init = v.initializer;
        assert!(is_locked(&v, &init, 1_000 + LOCK_PERIOD - 1));
        assert!(!is_locked(&v, &init, 1_000 + LOCK_PERIOD));
        assert!(!is_locked(&v, &Pubkey::new_unique(), 1_000));
    }
}
