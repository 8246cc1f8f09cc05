use anchor_lang::prelude::*;
use anchor_spl::token::TokenAccount;
use crate::{constants::*, error::VaultError, events::Withdrawn, state::{ShareBalance, Vault}};
use super::{liquefy::{Liquefy, LiquefyBumps, __client_accounts_liquefy, __cpi_client_accounts_liquefy}, withdraw::pay_out};

/// Compound, then redeem the caller's whole balance.
pub fn handler(ctx: Context<Exit>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let vault_key = ctx.accounts.vault.key();
    let owner = ctx.accounts.owner.key();
    let authority = ctx.accounts.vault_authority.to_account_info();

    ctx.accounts.liquefy.run(&mut ctx.accounts.vault, vault_key, &authority, now)?;

    let units = ctx.accounts.share_balance.units;
    let pool_balance = ctx.accounts.liquefy.vault_lp_account.amount;
    let amount = ctx
        .accounts
        .vault
        .withdraw(&mut ctx.accounts.share_balance, units, pool_balance, now)?;

    pay_out(
        ctx.accounts.liquefy.token_program.to_account_info(),
        ctx.accounts.liquefy.vault_lp_account.to_account_info(),
        ctx.accounts.owner_lp_account.to_account_info(),
        authority,
        vault_key,
        ctx.accounts.vault.authority_bump,
        amount,
    )?;

    emit!(Withdrawn { vault: vault_key, owner, units, amount });
    msg!("Exited: units={} amount={}", units, amount);
    Ok(())
}

#[derive(Accounts)]
pub struct Exit<'info> {
    pub owner: Signer<'info>,

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

    #[account(
        mut,
        seeds = [SHARE_SEED, vault.key().as_ref(), owner.key().as_ref()],
        bump = share_balance.bump,
        constraint = share_balance.owner == owner.key() @ VaultError::Unauthorized,
    )]
    pub share_balance: Box<Account<'info, ShareBalance>>,

    #[account(
        mut,
        constraint = owner_lp_account.mint == vault.lp_mint @ VaultError::MintMismatch,
    )]
    pub owner_lp_account: Box<Account<'info, TokenAccount>>,

    pub liquefy: Liquefy<'info>,
}
