use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};
use crate::{
    constants::*,
    error::VaultError,
    events::{VaultDeployed, VaultInitialized},
    router::RouterPool,
    state::{Registry, ShareBalance, Vault, VaultIndex, VaultParams},
};

/// Deploy and bootstrap the vault for one LP mint.
///
/// The reward pair is read from the router pool, which must be owned by
/// `router_program` and issue `lp_mint`. `initialization_amount` LP is pulled
/// from the initializer and minted back 1:1 as locked units.
#[allow(clippy::too_many_arguments)]
pub fn handler(
    ctx: Context<DeployVault>,
    fee_recipient: Pubkey,
    fee_enabled: bool,
    fee_rate_bps: u16,
    automation_interval: i64,
    initialization_amount: u64,
    symbol: String,
) -> Result<()> {
    require!(symbol.len() <= MAX_SYMBOL_LEN, VaultError::SymbolTooLong);
    require_keys_eq!(
        ctx.accounts.vault.lp_mint,
        Pubkey::default(),
        VaultError::AlreadyDeployed
    );

    let pool = RouterPool::load(
        &ctx.accounts.router_pool.to_account_info(),
        &ctx.accounts.router_program.key(),
    )?;
    require!(
        pool.matches(
            &ctx.accounts.lp_mint.key(),
            &ctx.accounts.reward_a_mint.key(),
            &ctx.accounts.reward_b_mint.key(),
        ),
        VaultError::PoolMismatch
    );

    let params = VaultParams { fee_recipient, fee_enabled, fee_rate_bps, automation_interval };
    params.validate()?;

    let now = Clock::get()?.unix_timestamp;
    let registry_key = ctx.accounts.registry.key();
    let vault_key = ctx.accounts.vault.key();
    let lp_mint = ctx.accounts.lp_mint.key();
    let initializer = ctx.accounts.initializer.key();
    let index = ctx.accounts.registry.register()?;

    let entry = &mut ctx.accounts.vault_index;
    entry.registry = registry_key;
    entry.index = index;
    entry.lp_mint = lp_mint;
    entry.vault = vault_key;
    entry.bump = ctx.bumps.vault_index;

    let vault = &mut ctx.accounts.vault;
    vault.registry = registry_key;
    vault.index = index;
    vault.lp_mint = lp_mint;
    vault.reward_a_mint = ctx.accounts.reward_a_mint.key();
    vault.reward_b_mint = ctx.accounts.reward_b_mint.key();
    vault.router_program = ctx.accounts.router_program.key();
    vault.router_pool = ctx.accounts.router_pool.key();
    vault.lp_account = ctx.accounts.vault_lp_account.key();
    vault.reward_a_account = ctx.accounts.reward_a_account.key();
    vault.reward_b_account = ctx.accounts.reward_b_account.key();
    vault.initializer = initializer;
    vault.symbol = symbol.clone();
    vault.bump = ctx.bumps.vault;
    vault.authority_bump = ctx.bumps.vault_authority;
    vault.apply_params(&registry_key, &params)?;

    emit!(VaultDeployed { vault: vault_key, lp_mint, index, symbol: symbol.clone() });

    // ── Bootstrap: pull the initialization LP, then mint against it ─────────
    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.initializer_lp_account.to_account_info(),
                to: ctx.accounts.vault_lp_account.to_account_info(),
                authority: ctx.accounts.initializer.to_account_info(),
            },
        ),
        initialization_amount,
    )?;
    ctx.accounts.vault_lp_account.reload()?;
    let pool_balance = ctx.accounts.vault_lp_account.amount;

    ctx.accounts
        .initializer_share_balance
        .open(vault_key, initializer, ctx.bumps.initializer_share_balance);
    ctx.accounts.vault.initialize(
        &registry_key,
        &mut ctx.accounts.initializer_share_balance,
        initialization_amount,
        pool_balance,
        now,
    )?;

    emit!(VaultInitialized {
        vault: vault_key,
        initializer,
        units: initialization_amount,
        unlock_at: ctx.accounts.vault.unlock_at(),
    });
    msg!(
        "Vault deployed: {} index={} lp_mint={} init={} fee={}bps",
        symbol,
        index,
        lp_mint,
        initialization_amount,
        fee_rate_bps
    );
    Ok(())
}

#[derive(Accounts)]
pub struct DeployVault<'info> {
    #[account(mut)]
    pub governor: Signer<'info>,

    /// Bootstrap depositor; its units are locked for LOCK_PERIOD
    pub initializer: Signer<'info>,

    #[account(
        mut,
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
        has_one = governor @ VaultError::Unauthorized,
    )]
    pub registry: Box<Account<'info, Registry>>,

    pub lp_mint: Box<Account<'info, Mint>>,
    pub reward_a_mint: Box<Account<'info, Mint>>,
    pub reward_b_mint: Box<Account<'info, Mint>>,

    /// CHECK: router program, must own router_pool
    #[account(executable)]
    pub router_program: UncheckedAccount<'info>,

    /// CHECK: owner and layout checked by RouterPool::load
    pub router_pool: UncheckedAccount<'info>,

    // init_if_needed so a second deploy fails with AlreadyDeployed
    #[account(
        init_if_needed,
        payer = governor,
        space = Vault::LEN,
        seeds = [VAULT_SEED, lp_mint.key().as_ref()],
        bump,
    )]
    pub vault: Box<Account<'info, Vault>>,

    /// CHECK: PDA vault authority, owns the vault's token accounts
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault.key().as_ref()],
        bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        init,
        payer = governor,
        space = VaultIndex::LEN,
        seeds = [VAULT_INDEX_SEED, registry.key().as_ref(), &registry.vault_count.to_le_bytes()],
        bump,
    )]
    pub vault_index: Box<Account<'info, VaultIndex>>,

    #[account(
        init_if_needed,
        payer = governor,
        seeds = [VAULT_LP_SEED, vault.key().as_ref()],
        bump,
        token::mint = lp_mint,
        token::authority = vault_authority,
    )]
    pub vault_lp_account: Box<Account<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = governor,
        seeds = [REWARD_A_SEED, vault.key().as_ref()],
        bump,
        token::mint = reward_a_mint,
        token::authority = vault_authority,
    )]
    pub reward_a_account: Box<Account<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = governor,
        seeds = [REWARD_B_SEED, vault.key().as_ref()],
        bump,
        token::mint = reward_b_mint,
        token::authority = vault_authority,
    )]
    pub reward_b_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = initializer_lp_account.mint == lp_mint.key() @ VaultError::MintMismatch,
        constraint = initializer_lp_account.owner == initializer.key(),
    )]
    pub initializer_lp_account: Box<Account<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = governor,
        space = ShareBalance::LEN,
        seeds = [SHARE_SEED, vault.key().as_ref(), initializer.key().as_ref()],
        bump,
    )]
    pub initializer_share_balance: Box<Account<'info, ShareBalance>>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}
