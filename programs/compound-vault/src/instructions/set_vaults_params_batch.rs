use anchor_lang::prelude::*;
use crate::{error::VaultError, state::VaultParams};
use super::set_vaults_params::{target_count, update_vaults, SetVaultsParams};

/// Per-vault parameters as parallel arrays. Lengths are checked against the
/// target count before any vault is touched.
pub fn check_lengths(
    count: usize,
    fee_recipients: &[Pubkey],
    fee_enabled: &[bool],
    fee_rates_bps: &[u16],
    automation_intervals: &[i64],
) -> Result<()> {
    require!(
        fee_recipients.len() == count
            && fee_enabled.len() == count
            && fee_rates_bps.len() == count
            && automation_intervals.len() == count,
        VaultError::InconsistentParamsLength
    );
    Ok(())
}

/// Validate the arrays against the target count, then update each vault with
/// its own entry.
#[allow(clippy::too_many_arguments)]
pub(crate) fn apply_batch<'info>(
    registry_key: Pubkey,
    vault_count: u64,
    lp_mints: &[Pubkey],
    vaults: &[AccountInfo<'info>],
    fee_recipients: &[Pubkey],
    fee_enabled: &[bool],
    fee_rates_bps: &[u16],
    automation_intervals: &[i64],
) -> Result<usize> {
    let count = target_count(lp_mints, vault_count)?;
    check_lengths(count, fee_recipients, fee_enabled, fee_rates_bps, automation_intervals)?;

    update_vaults(registry_key, vault_count, lp_mints, vaults, |i| VaultParams {
        fee_recipient: fee_recipients[i],
        fee_enabled: fee_enabled[i],
        fee_rate_bps: fee_rates_bps[i],
        automation_interval: automation_intervals[i],
    })
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, SetVaultsParams<'info>>,
    lp_mints: Vec<Pubkey>,
    fee_recipients: Vec<Pubkey>,
    fee_enabled: Vec<bool>,
    fee_rates_bps: Vec<u16>,
    automation_intervals: Vec<i64>,
) -> Result<()> {
    let updated = apply_batch(
        ctx.accounts.registry.key(),
        ctx.accounts.registry.vault_count,
        &lp_mints,
        ctx.remaining_accounts,
        &fee_recipients,
        &fee_enabled,
        &fee_rates_bps,
        &automation_intervals,
    )?;
    msg!("Params batch updated: vaults={}", updated);
    Ok(())
}
