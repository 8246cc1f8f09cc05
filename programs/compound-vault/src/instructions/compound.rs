use anchor_lang::prelude::*;
use crate::{constants::*, state::Vault};
use super::liquefy::{Liquefy, LiquefyBumps, __client_accounts_liquefy, __cpi_client_accounts_liquefy};

/// Permissionless compound of one vault's rewards into LP.
pub fn handler(ctx: Context<Compound>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let vault_key = ctx.accounts.vault.key();
    let authority = ctx.accounts.vault_authority.to_account_info();
    ctx.accounts.liquefy.run(&mut ctx.accounts.vault, vault_key, &authority, now)
}

#[derive(Accounts)]
pub struct Compound<'info> {
    #[account(
        mut,
        seeds = [VAULT_SEED, vault.lp_mint.as_ref()],
        bump = vault.bump,
    )]
    pub vault: Box<Account<'info, Vault>>,

    /// CHECK: PDA vault authority
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault.key().as_ref()],
        bump = vault.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    pub liquefy: Liquefy<'info>,
}
