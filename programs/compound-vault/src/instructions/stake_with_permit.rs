use anchor_lang::prelude::*;
use anchor_spl::token::{self, Approve, TokenAccount, Transfer};
use crate::{constants::*, error::VaultError, events::Staked, state::{ShareBalance, Vault}};
use super::liquefy::{Liquefy, LiquefyBumps, __client_accounts_liquefy, __cpi_client_accounts_liquefy};

/// Gasless stake: `relayer` pays, `owner` co-signs a one-shot delegate
/// approval of exactly `amount` valid until `deadline`. The vault authority
/// then pulls the LP as delegate.
pub fn handler(ctx: Context<StakeWithPermit>, amount: u64, deadline: i64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    require!(now <= deadline, VaultError::PermitExpired);
    require!(amount > 0, VaultError::ZeroStakeAmount);
    require!(ctx.accounts.vault.initialized, VaultError::VaultNotInitialized);

    let vault_key = ctx.accounts.vault.key();
    let owner = ctx.accounts.owner.key();
    let authority = ctx.accounts.vault_authority.to_account_info();

    ctx.accounts.liquefy.run(&mut ctx.accounts.vault, vault_key, &authority, now)?;

    let pool_balance = ctx.accounts.liquefy.vault_lp_account.amount;
    ctx.accounts.share_balance.open(vault_key, owner, ctx.bumps.share_balance);
    let units = ctx
        .accounts
        .vault
        .stake(&mut ctx.accounts.share_balance, amount, pool_balance)?;

    let token_program = ctx.accounts.liquefy.token_program.to_account_info();
    token::approve(
        CpiContext::new(
            token_program.clone(),
            Approve {
                to: ctx.accounts.owner_lp_account.to_account_info(),
                delegate: authority.clone(),
                authority: ctx.accounts.owner.to_account_info(),
            },
        ),
        amount,
    )?;

    let authority_bump = ctx.accounts.vault.authority_bump;
    let seeds: &[&[u8]] = &[VAULT_AUTHORITY_SEED, vault_key.as_ref(), &[authority_bump]];
    token::transfer(
        CpiContext::new_with_signer(
            token_program,
            Transfer {
                from: ctx.accounts.owner_lp_account.to_account_info(),
                to: ctx.accounts.liquefy.vault_lp_account.to_account_info(),
                authority,
            },
            &[seeds],
        ),
        amount,
    )?;

    emit!(Staked { vault: vault_key, owner, amount, units });
    msg!(
        "Staked with permit: amount={} units={} relayer={}",
        amount,
        units,
        ctx.accounts.relayer.key()
    );
    Ok(())
}

#[derive(Accounts)]
pub struct StakeWithPermit<'info> {
    #[account(mut)]
    pub relayer: Signer<'info>,

    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault.lp_mint.as_ref()],
        bump = vault.bump,
    )]
    pub vault: Box<Account<'info, Vault>>,

    /// CHECK: PDA vault authority, becomes the one-shot delegate
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault.key().as_ref()],
        bump = vault.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = relayer,
        space = ShareBalance::LEN,
        seeds = [SHARE_SEED, vault.key().as_ref(), owner.key().as_ref()],
        bump,
    )]
    pub share_balance: Box<Account<'info, ShareBalance>>,

    #[account(
        mut,
        constraint = owner_lp_account.mint == vault.lp_mint @ VaultError::MintMismatch,
        constraint = owner_lp_account.owner == owner.key(),
    )]
    pub owner_lp_account: Box<Account<'info, TokenAccount>>,

    pub liquefy: Liquefy<'info>,

    pub system_program: Program<'info, System>,
}
