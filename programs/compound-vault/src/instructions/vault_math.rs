use anchor_lang::prelude::*;
use crate::{constants::*, error::VaultError};

/// Split of freshly minted LP between the fee recipient and the vault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiquidityCut {
    /// LP sent to the fee recipient.
    pub fee: u64,
    /// LP retained by the vault (liquidity − fee).
    pub net: u64,
}

/// Units minted for a deposit of `amount` LP.
///
/// `pool_balance` is the vault's LP balance before the deposit lands.
/// An empty ledger mints 1:1; otherwise `amount * total_supply / pool_balance`.
pub fn units_for_deposit(amount: u64, total_supply: u64, pool_balance: u64) -> Result<u64> {
    if total_supply == 0 {
        return Ok(amount);
    }
    if pool_balance == 0 {
        return Ok(0);
    }
    let units = (amount as u128)
        .checked_mul(total_supply as u128)
        .ok_or(VaultError::MathOverflow)?
        / pool_balance as u128;
    u64::try_from(units).map_err(|_| error!(VaultError::MathOverflow))
}

/// LP paid out for burning `units` out of `total_supply`.
pub fn assets_for_units(units: u64, pool_balance: u64, total_supply: u64) -> Result<u64> {
    if total_supply == 0 {
        return Ok(0);
    }
    let assets = (units as u128)
        .checked_mul(pool_balance as u128)
        .ok_or(VaultError::MathOverflow)?
        / total_supply as u128;
    u64::try_from(assets).map_err(|_| error!(VaultError::MathOverflow))
}

/// Take the compounding fee out of newly minted liquidity only.
pub fn split_fee(liquidity: u64, fee_enabled: bool, fee_rate_bps: u16) -> Result<LiquidityCut> {
    if !fee_enabled || fee_rate_bps == 0 {
        return Ok(LiquidityCut { fee: 0, net: liquidity });
    }
    require!(fee_rate_bps <= MAX_FEE_BPS, VaultError::ExcessiveFeeValue);
    let fee = (liquidity as u128)
        .checked_mul(fee_rate_bps as u128)
        .ok_or(VaultError::MathOverflow)?
        / BPS_DENOMINATOR;
    let fee = fee as u64; // fee ≤ liquidity since rate ≤ 10_000
    Ok(LiquidityCut { fee, net: liquidity - fee })
}

/// Strictly more than `interval` seconds have passed since `last`.
pub fn interval_elapsed(now: i64, last: i64, interval: i64) -> bool {
    (now as i128) - (last as i128) > interval as i128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ledger_mints_one_to_one() {
        assert_eq!(units_for_deposit(1_000, 0, 0).unwrap(), 1_000);
        assert_eq!(units_for_deposit(1_000, 0, 55).unwrap(), 1_000);
    }

    #[test]
    fn deposit_is_priced_against_current_balance() {
        // 2000 LP backing 1000 units: every unit is worth 2 LP
        assert_eq!(units_for_deposit(500, 1_000, 2_000).unwrap(), 250);
        // 100 * 333 / 1000 = 33.3 → 33
        assert_eq!(units_for_deposit(100, 333, 1_000).unwrap(), 33);
    }

    #[test]
    fn dust_deposit_rounds_to_zero_units() {
        assert_eq!(units_for_deposit(1, 1_000, 3_000).unwrap(), 0);
        assert_eq!(units_for_deposit(10, 1_000, 0).unwrap(), 0);
    }

    #[test]
    fn large_deposit_does_not_overflow() {
        let units = units_for_deposit(1_000_000_000_000_000_000, 1_000_000_000, 1_000_000_000).unwrap();
        assert_eq!(units, 1_000_000_000_000_000_000);
        assert!(units_for_deposit(u64::MAX, u64::MAX, 1).is_err());
    }

    #[test]
    fn redemption_is_proportional() {
        assert_eq!(assets_for_units(500, 2_000, 1_000).unwrap(), 1_000);
        assert_eq!(assets_for_units(1_000, 2_000, 1_000).unwrap(), 2_000);
        assert_eq!(assets_for_units(1, 10, 3).unwrap(), 3);
        assert_eq!(assets_for_units(5, 10, 0).unwrap(), 0);
    }

    #[test]
    fn fee_is_taken_from_liquidity() {
        assert_eq!(split_fee(100, true, 200).unwrap(), LiquidityCut { fee: 2, net: 98 });
        assert_eq!(split_fee(49, true, 200).unwrap(), LiquidityCut { fee: 0, net: 49 });
    }

    #[test]
    fn disabled_or_zero_fee_keeps_everything() {
        assert_eq!(split_fee(100, false, 200).unwrap(), LiquidityCut { fee: 0, net: 100 });
        assert_eq!(split_fee(100, true, 0).unwrap(), LiquidityCut { fee: 0, net: 100 });
    }

    #[test]
    fn fee_above_cap_is_rejected() {
        assert!(split_fee(100, true, MAX_FEE_BPS + 1).is_err());
    }

    #[test]
    fn interval_must_be_strictly_exceeded() {
        assert!(!interval_elapsed(1_100, 1_000, 100));
        assert!(interval_elapsed(1_101, 1_000, 100));
        assert!(interval_elapsed(1, 0, 0));
        assert!(!interval_elapsed(0, 0, 0));
        assert!(interval_elapsed(i64::MAX, i64::MIN, 0));
    }
}
