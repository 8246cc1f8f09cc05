use anchor_lang::prelude::*;
use anchor_spl::token::{self, TokenAccount, Transfer};
use crate::{constants::*, error::VaultError, events::Staked, state::{ShareBalance, Vault}};
use super::liquefy::{Liquefy, LiquefyBumps, __client_accounts_liquefy, __cpi_client_accounts_liquefy};

/// Deposit LP and receive units at the post-compound rate.
pub fn handler(ctx: Context<Stake>, amount: u64) -> Result<()> {
    require!(amount > 0, VaultError::ZeroStakeAmount);
    require!(ctx.accounts.vault.initialized, VaultError::VaultNotInitialized);

    let now = Clock::get()?.unix_timestamp;
    let vault_key = ctx.accounts.vault.key();
    let depositor = ctx.accounts.depositor.key();
    let authority = ctx.accounts.vault_authority.to_account_info();

    ctx.accounts.liquefy.run(&mut ctx.accounts.vault, vault_key, &authority, now)?;

    // Balance before the deposit lands
    let pool_balance = ctx.accounts.liquefy.vault_lp_account.amount;
    ctx.accounts.share_balance.open(vault_key, depositor, ctx.bumps.share_balance);
    let units = ctx
        .accounts
        .vault
        .stake(&mut ctx.accounts.share_balance, amount, pool_balance)?;

    token::transfer(
        CpiContext::new(
            ctx.accounts.liquefy.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.depositor_lp_account.to_account_info(),
                to: ctx.accounts.liquefy.vault_lp_account.to_account_info(),
                authority: ctx.accounts.depositor.to_account_info(),
            },
        ),
        amount,
    )?;

    emit!(Staked { vault: vault_key, owner: depositor, amount, units });
    msg!("Staked: amount={} units={} supply={}", amount, units, ctx.accounts.vault.total_supply);
    Ok(())
}

#[derive(Accounts)]
pub struct Stake<'info> {
    #[account(mut)]
    pub depositor: Signer<'info>,

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
        init_if_needed,
        payer = depositor,
        space = ShareBalance::LEN,
        seeds = [SHARE_SEED, vault.key().as_ref(), depositor.key().as_ref()],
        bump,
    )]
    pub share_balance: Box<Account<'info, ShareBalance>>,

    #[account(
        mut,
        constraint = depositor_lp_account.mint == vault.lp_mint @ VaultError::MintMismatch,
        constraint = depositor_lp_account.owner == depositor.key(),
    )]
    pub depositor_lp_account: Box<Account<'info, TokenAccount>>,

    pub liquefy: Liquefy<'info>,

    pub system_program: Program<'info, System>,
}
