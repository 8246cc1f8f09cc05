use anchor_lang::prelude::*;
use crate::{constants::*, events::RegistryInitialized, state::Registry};

/// Create the singleton registry. `governor` deploys vaults and sets their
/// parameters from here on.
pub fn handler(ctx: Context<InitializeRegistry>, governor: Pubkey) -> Result<()> {
    let registry = &mut ctx.accounts.registry;
    registry.governor = governor;
    registry.vault_count = 0;
    registry.bump = ctx.bumps.registry;

    emit!(RegistryInitialized { registry: registry.key(), governor });
    msg!("Registry created: governor={}", governor);
    Ok(())
}

#[derive(Accounts)]
pub struct InitializeRegistry<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,

    #[account(
        init,
        payer = payer,
        space = Registry::LEN,
        seeds = [REGISTRY_SEED],
        bump,
    )]
    pub registry: Account<'info, Registry>,

    pub system_program: Program<'info, System>,
}
