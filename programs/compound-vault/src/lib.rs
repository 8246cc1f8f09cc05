/// Compound Vault: pooled LP custody with automated reward compounding.
///
/// A registry deploys one vault per LP mint. Depositors stake LP for
/// ownership units; the vault's two reward balances are paired back into LP
/// through an external router, growing the LP redeemable per unit. Keepers
/// find vaults needing work with `check_work` and dispatch `perform_work`.
///
/// Instructions:
///   initialize_registry: create the registry and set its governor
///   set_governor: rotate the governor key
///   deploy_vault: deploy + bootstrap a vault for one LP mint
///   set_vaults_params: one parameter block for many vaults
///   set_vaults_params_batch: per-vault parameters as parallel arrays
///   stake / stake_with_permit: deposit LP for units (compounds first)
///   withdraw: burn units for LP, no compounding
///   exit: compound, then redeem the whole balance
///   transfer_units: move units between holders
///   compound: permissionless compound of one vault
///   check_work / perform_work: keeper discovery and dispatch
///   needs_compounding: read-only probe of one vault

// ─── Security contact ─────────────────────────────────────────────────────────

use solana_security_txt::security_txt;

#[cfg(not(feature = "no-entrypoint"))]
security_txt! {
    name:             "Compound Vault",
    project_url:      "https://github.com/compound-vault/compound-vault",
    contacts:         "email:security@compound-vault.dev",
    policy:           "Please report security vulnerabilities by email. \
                       We aim to respond within 48 hours.",
    source_code:      "https://github.com/compound-vault/compound-vault",
    preferred_languages: "en"
}

pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod router;
pub mod state;
#[cfg(test)]
mod test_fixtures;

use anchor_lang::prelude::*;
pub use constants::*;
pub use instructions::*;
pub use state::*;

declare_id!("3qiDvpsFpHvgRR2RAPcVJrJK8f3CdTUcAye3C3YM7Abi");

#[program]
pub mod compound_vault {
    use super::*;

    /// Create the singleton registry.
    pub fn initialize_registry(ctx: Context<InitializeRegistry>, governor: Pubkey) -> Result<()> {
        initialize_registry::handler(ctx, governor)
    }

    /// Governor only.
    pub fn set_governor(ctx: Context<SetGovernor>, new_governor: Pubkey) -> Result<()> {
        set_governor::handler(ctx, new_governor)
    }

    /// Deploy the vault for `lp_mint` and bootstrap it with the initializer's LP.
    #[allow(clippy::too_many_arguments)]
    pub fn deploy_vault(
        ctx: Context<DeployVault>,
        fee_recipient: Pubkey,
        fee_enabled: bool,
        fee_rate_bps: u16,
        automation_interval: i64,
        initialization_amount: u64,
        symbol: String,
    ) -> Result<()> {
        deploy_vault::handler(
            ctx,
            fee_recipient,
            fee_enabled,
            fee_rate_bps,
            automation_interval,
            initialization_amount,
            symbol,
        )
    }

    /// Apply `params` to the vaults of `lp_mints` (all vaults if empty).
    /// Vault accounts go in remaining accounts, writable, in target order.
    pub fn set_vaults_params<'info>(
        ctx: Context<'_, '_, 'info, 'info, SetVaultsParams<'info>>,
        lp_mints: Vec<Pubkey>,
        params: VaultParams,
    ) -> Result<()> {
        set_vaults_params::handler(ctx, lp_mints, params)
    }

    pub fn set_vaults_params_batch<'info>(
        ctx: Context<'_, '_, 'info, 'info, SetVaultsParams<'info>>,
        lp_mints: Vec<Pubkey>,
        fee_recipients: Vec<Pubkey>,
        fee_enabled: Vec<bool>,
        fee_rates_bps: Vec<u16>,
        automation_intervals: Vec<i64>,
    ) -> Result<()> {
        set_vaults_params_batch::handler(
            ctx,
            lp_mints,
            fee_recipients,
            fee_enabled,
            fee_rates_bps,
            automation_intervals,
        )
    }

    /// Compound, then deposit `amount` LP for units.
    pub fn stake(ctx: Context<Stake>, amount: u64) -> Result<()> {
        stake::handler(ctx, amount)
    }

    /// Relayer-paid stake authorised by the owner's co-signature.
    pub fn stake_with_permit(
        ctx: Context<StakeWithPermit>,
        amount: u64,
        deadline: i64,
    ) -> Result<()> {
        stake_with_permit::handler(ctx, amount, deadline)
    }

    /// Burn `units` for LP at the current rate. Does not compound.
    pub fn withdraw(ctx: Context<Withdraw>, units: u64) -> Result<()> {
        withdraw::handler(ctx, units)
    }

    pub fn exit(ctx: Context<Exit>) -> Result<()> {
        exit::handler(ctx)
    }

    pub fn transfer_units(ctx: Context<TransferUnits>, units: u64) -> Result<()> {
        transfer_units::handler(ctx, units)
    }

    /// Pair the vault's reward balances into LP. Anyone may call.
    pub fn compound(ctx: Context<Compound>) -> Result<()> {
        compound::handler(ctx)
    }

    /// Simulate to find the first vault in `[start_index, end_index)` needing work.
    pub fn check_work<'info>(
        ctx: Context<'_, '_, 'info, 'info, CheckWork<'info>>,
        start_index: u64,
        end_index: u64,
    ) -> Result<CheckWorkResult> {
        check_work::handler(ctx, start_index, end_index)
    }

    pub fn perform_work(ctx: Context<PerformWork>, perform_data: Vec<u8>) -> Result<()> {
        perform_work::handler(ctx, perform_data)
    }

    pub fn needs_compounding(ctx: Context<NeedsCompounding>) -> Result<bool> {
        needs_compounding::handler(ctx)
    }
}
