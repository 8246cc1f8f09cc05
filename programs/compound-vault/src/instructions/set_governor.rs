use anchor_lang::prelude::*;
use crate::{constants::*, error::VaultError, events::GovernorUpdated, state::Registry};

pub fn handler(ctx: Context<SetGovernor>, new_governor: Pubkey) -> Result<()> {
    let registry = &mut ctx.accounts.registry;
    let previous = registry.governor;
    registry.governor = new_governor;

    emit!(GovernorUpdated { registry: registry.key(), previous, governor: new_governor });
    msg!("Governor rotated: {} -> {}", previous, new_governor);
    Ok(())
}

#[derive(Accounts)]
pub struct SetGovernor<'info> {
    pub governor: Signer<'info>,

    #[account(
        mut,
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
        has_one = governor @ VaultError::Unauthorized,
    )]
    pub registry: Account<'info, Registry>,
}
