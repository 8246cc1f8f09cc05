use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};
use crate::{constants::*, error::VaultError, events::Withdrawn, state::{ShareBalance, Vault}};

/// Shared payout once units are burned: vault authority → owner.
pub(crate) fn pay_out<'info>(
    token_program: AccountInfo<'info>,
    vault_lp: AccountInfo<'info>,
    owner_lp: AccountInfo<'info>,
    vault_authority: AccountInfo<'info>,
    vault_key: Pubkey,
    authority_bump: u8,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let seeds: &[&[u8]] = &[VAULT_AUTHORITY_SEED, vault_key.as_ref(), &[authority_bump]];
    token::transfer(
        CpiContext::new_with_signer(
            token_program,
            Transfer { from: vault_lp, to: owner_lp, authority: vault_authority },
            &[seeds],
        ),
        amount,
    )
}

/// Burn units and receive the proportional LP. Does not compound.
pub fn handler(ctx: Context<Withdraw>, units: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let vault_key = ctx.accounts.vault.key();
    let owner = ctx.accounts.owner.key();
    let pool_balance = ctx.accounts.vault_lp_account.amount;

    let amount = ctx
        .accounts
        .vault
        .withdraw(&mut ctx.accounts.share_balance, units, pool_balance, now)?;

    pay_out(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.vault_lp_account.to_account_info(),
        ctx.accounts.owner_lp_account.to_account_info(),
        ctx.accounts.vault_authority.to_account_info(),
        vault_key,
        ctx.accounts.vault.authority_bump,
        amount,
    )?;

    emit!(Withdrawn { vault: vault_key, owner, units, amount });
    msg!("Withdrawn: units={} amount={} supply={}", units, amount, ctx.accounts.vault.total_supply);
    Ok(())
}

#[derive(Accounts)]
pub struct Withdraw<'info> {
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
        address = vault.lp_account @ VaultError::InvalidVault,
    )]
    pub vault_lp_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = owner_lp_account.mint == vault.lp_mint @ VaultError::MintMismatch,
    )]
    pub owner_lp_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}
