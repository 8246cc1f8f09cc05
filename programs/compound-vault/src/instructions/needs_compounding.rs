use anchor_lang::prelude::*;
use anchor_spl::token::TokenAccount;
use crate::{constants::*, error::VaultError, state::Vault};

pub fn handler(ctx: Context<NeedsCompounding>) -> Result<bool> {
    let now = Clock::get()?.unix_timestamp;
    Ok(ctx.accounts.vault.needs_compounding(
        ctx.accounts.reward_a_account.amount,
        ctx.accounts.reward_b_account.amount,
        now,
    ))
}

#[derive(Accounts)]
pub struct NeedsCompounding<'info> {
    #[account(
        seeds = [VAULT_SEED, vault.lp_mint.as_ref()],
        bump = vault.bump,
    )]
    pub vault: Box<Account<'info, Vault>>,

    #[account(address = vault.reward_a_account @ VaultError::InvalidVault)]
    pub reward_a_account: Box<Account<'info, TokenAccount>>,

    #[account(address = vault.reward_b_account @ VaultError::InvalidVault)]
    pub reward_b_account: Box<Account<'info, TokenAccount>>,
}
