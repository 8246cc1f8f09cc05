use anchor_lang::prelude::*;
use crate::{constants::*, error::VaultError, state::{Registry, Vault}};
use super::liquefy::{Liquefy, LiquefyBumps, __client_accounts_liquefy, __cpi_client_accounts_liquefy};

/// LP mint carried in check_work's `perform_data`.
pub fn decode_perform_data(perform_data: &[u8]) -> Result<Pubkey> {
    let bytes: [u8; 32] = perform_data
        .try_into()
        .map_err(|_| error!(VaultError::InvalidVault))?;
    Ok(Pubkey::new_from_array(bytes))
}

/// Keeper dispatch. A stale or repeated call is a no-op through the
/// empty-reward check in the compounding path.
pub fn handler(ctx: Context<PerformWork>, perform_data: Vec<u8>) -> Result<()> {
    let lp_mint = decode_perform_data(&perform_data)?;
    require_keys_eq!(ctx.accounts.vault.lp_mint, lp_mint, VaultError::InvalidVault);
    require_keys_eq!(
        ctx.accounts.vault.registry,
        ctx.accounts.registry.key(),
        VaultError::InvalidVault
    );

    let now = Clock::get()?.unix_timestamp;
    let vault_key = ctx.accounts.vault.key();
    let authority = ctx.accounts.vault_authority.to_account_info();
    msg!("perform_work: lp_mint={}", lp_mint);
    ctx.accounts.liquefy.run(&mut ctx.accounts.vault, vault_key, &authority, now)
}

#[derive(Accounts)]
pub struct PerformWork<'info> {
    #[account(seeds = [REGISTRY_SEED], bump = registry.bump)]
    pub registry: Account<'info, Registry>,

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_32_byte_mint() {
        let mint = Pubkey::new_unique();
        assert_eq!(decode_perform_data(mint.as_ref()).unwrap(), mint);
    }

    #[test]
    fn malformed_payload_is_rejected() {
        assert!(decode_perform_data(&[]).is_err());
        assert!(decode_perform_data(&[1u8; 31]).is_err());
        assert!(decode_perform_data(&[1u8; 33]).is_err());
    }
}
