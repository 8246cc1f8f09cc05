use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};
use crate::{
    constants::*,
    error::VaultError,
    events::Liquefied,
    router::{AddLiquidity, RouterPool},
    state::Vault,
};

/// Accounts the compounding path touches, shared by every instruction that
/// compounds first (compound, stake, stake_with_permit, exit, perform_work).
/// The owning instruction validates `vault` and `vault_authority`; `verify`
/// ties these accounts to that vault.
#[derive(Accounts)]
pub struct Liquefy<'info> {
    #[account(mut)]
    pub vault_lp_account: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub reward_a_account: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub reward_b_account: Box<Account<'info, TokenAccount>>,

    /// CHECK: only read when a fee is due; check_fee_account validates it then
    #[account(mut)]
    pub fee_recipient_lp_account: UncheckedAccount<'info>,

    /// CHECK: compared against vault.lp_mint; the router mints into vault_lp
    #[account(mut)]
    pub lp_mint: UncheckedAccount<'info>,

    /// CHECK: compared against vault.router_program
    pub router_program: UncheckedAccount<'info>,

    /// CHECK: compared against vault.router_pool; owner and layout checked by RouterPool::load
    #[account(mut)]
    pub router_pool: UncheckedAccount<'info>,

    /// CHECK: must equal the router pool's token A account
    #[account(mut)]
    pub pool_token_a: UncheckedAccount<'info>,

    /// CHECK: must equal the router pool's token B account
    #[account(mut)]
    pub pool_token_b: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
}

/// The fee destination must be an LP token account of the fee recipient.
/// A missing or closed account is rejected here, never on the no-fee path.
pub fn check_fee_account(info: &AccountInfo, vault: &Vault) -> Result<()> {
    require_keys_eq!(*info.owner, token::ID, VaultError::InvalidFeeAccount);
    let account = {
        let data = info.try_borrow_data()?;
        TokenAccount::try_deserialize(&mut &data[..])
            .map_err(|_| error!(VaultError::InvalidFeeAccount))?
    };
    require_keys_eq!(account.mint, vault.lp_mint, VaultError::MintMismatch);
    require_keys_eq!(account.owner, vault.params.fee_recipient, VaultError::Unauthorized);
    Ok(())
}

impl<'info> Liquefy<'info> {
    pub fn verify(&self, vault: &Vault) -> Result<()> {
        require_keys_eq!(self.vault_lp_account.key(), vault.lp_account, VaultError::InvalidVault);
        require_keys_eq!(self.reward_a_account.key(), vault.reward_a_account, VaultError::InvalidVault);
        require_keys_eq!(self.reward_b_account.key(), vault.reward_b_account, VaultError::InvalidVault);
        require_keys_eq!(self.lp_mint.key(), vault.lp_mint, VaultError::MintMismatch);
        require_keys_eq!(self.router_program.key(), vault.router_program, VaultError::PoolMismatch);
        require_keys_eq!(self.router_pool.key(), vault.router_pool, VaultError::PoolMismatch);
        Ok(())
    }

    /// Pair both reward balances into LP and skim the fee.
    ///
    /// No-op when either reward leg is empty. `last_compounded_at` is stamped
    /// before the router CPI. Leaves `vault_lp_account` reloaded so callers
    /// price against the post-compound balance.
    pub fn run(
        &mut self,
        vault: &mut Vault,
        vault_key: Pubkey,
        vault_authority: &AccountInfo<'info>,
        now: i64,
    ) -> Result<()> {
        self.verify(vault)?;

        let reward_a = self.reward_a_account.amount;
        let reward_b = self.reward_b_account.amount;
        if !vault.begin_compound(reward_a, reward_b, now) {
            msg!("Nothing to compound: a={} b={}", reward_a, reward_b);
            return Ok(());
        }

        let pool = RouterPool::load(&self.router_pool.to_account_info(), &vault.router_program)?;
        require_keys_eq!(self.pool_token_a.key(), pool.token_a, VaultError::PoolMismatch);
        require_keys_eq!(self.pool_token_b.key(), pool.token_b, VaultError::PoolMismatch);

        let lp_before = self.vault_lp_account.amount;
        let authority_bump = vault.authority_bump;
        let seeds: &[&[u8]] = &[VAULT_AUTHORITY_SEED, vault_key.as_ref(), &[authority_bump]];
        let signer = &[seeds];

        let router_program = self.router_program.to_account_info();
        let router_pool = self.router_pool.to_account_info();
        let reward_a_info = self.reward_a_account.to_account_info();
        let reward_b_info = self.reward_b_account.to_account_info();
        let pool_token_a = self.pool_token_a.to_account_info();
        let pool_token_b = self.pool_token_b.to_account_info();
        let lp_mint = self.lp_mint.to_account_info();
        let vault_lp = self.vault_lp_account.to_account_info();
        let token_program = self.token_program.to_account_info();
        AddLiquidity {
            router_program: &router_program,
            pool: &router_pool,
            owner: vault_authority,
            owner_token_a: &reward_a_info,
            owner_token_b: &reward_b_info,
            pool_token_a: &pool_token_a,
            pool_token_b: &pool_token_b,
            lp_mint: &lp_mint,
            owner_lp: &vault_lp,
            token_program: &token_program,
        }
        .invoke(reward_a, reward_b, now, signer)?;

        self.vault_lp_account.reload()?;
        self.reward_a_account.reload()?;
        self.reward_b_account.reload()?;

        let liquidity = self
            .vault_lp_account
            .amount
            .checked_sub(lp_before)
            .ok_or(VaultError::MathOverflow)?;
        let amount_a = reward_a.saturating_sub(self.reward_a_account.amount);
        let amount_b = reward_b.saturating_sub(self.reward_b_account.amount);
        let cut = vault.split_liquidity(liquidity)?;

        if cut.fee > 0 {
            let fee_account = self.fee_recipient_lp_account.to_account_info();
            check_fee_account(&fee_account, vault)?;
            token::transfer(
                CpiContext::new_with_signer(
                    token_program,
                    Transfer {
                        from: vault_lp,
                        to: fee_account,
                        authority: vault_authority.clone(),
                    },
                    signer,
                ),
                cut.fee,
            )?;
            self.vault_lp_account.reload()?;
        }

        emit!(Liquefied {
            vault: vault_key,
            amount_a,
            amount_b,
            liquidity,
            fee: cut.fee,
            net: cut.net,
        });
        msg!(
            "Liquefied: a={} b={} liquidity={} fee={} net={}",
            amount_a,
            amount_b,
            liquidity,
            cut.fee,
            cut.net
        );
        Ok(())
    }
}
