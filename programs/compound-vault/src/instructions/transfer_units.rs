use anchor_lang::prelude::*;
use crate::{constants::*, error::VaultError, events::UnitsTransferred, state::{ShareBalance, Vault}};

/// Move units between holders of the same vault. Subject to the
/// initializer lock like any other outflow.
pub fn handler(ctx: Context<TransferUnits>, units: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let vault_key = ctx.accounts.vault.key();
    let from = ctx.accounts.sender.key();
    let to = ctx.accounts.recipient.key();

    ctx.accounts
        .recipient_share_balance
        .open(vault_key, to, ctx.bumps.recipient_share_balance);
    ctx.accounts.vault.transfer_units(
        &mut ctx.accounts.sender_share_balance,
        &mut ctx.accounts.recipient_share_balance,
        units,
        now,
    )?;

    emit!(UnitsTransferred { vault: vault_key, from, to, units });
    msg!("Units transferred: {} -> {} units={}", from, to, units);
    Ok(())
}

#[derive(Accounts)]
pub struct TransferUnits<'info> {
    #[account(mut)]
    pub sender: Signer<'info>,

    /// CHECK: any wallet may receive units
    #[account(constraint = recipient.key() != sender.key() @ VaultError::SelfTransfer)]
    pub recipient: UncheckedAccount<'info>,

    #[account(
        seeds = [VAULT_SEED, vault.lp_mint.as_ref()],
        bump = vault.bump,
    )]
    pub vault: Box<Account<'info, Vault>>,

    #[account(
        mut,
        seeds = [SHARE_SEED, vault.key().as_ref(), sender.key().as_ref()],
        bump = sender_share_balance.bump,
        constraint = sender_share_balance.owner == sender.key() @ VaultError::Unauthorized,
    )]
    pub sender_share_balance: Box<Account<'info, ShareBalance>>,

    #[account(
        init_if_needed,
        payer = sender,
        space = ShareBalance::LEN,
        seeds = [SHARE_SEED, vault.key().as_ref(), recipient.key().as_ref()],
        bump,
    )]
    pub recipient_share_balance: Box<Account<'info, ShareBalance>>,

    pub system_program: Program<'info, System>,
}
