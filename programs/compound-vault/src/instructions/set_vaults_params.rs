use anchor_lang::prelude::*;
use crate::{
    constants::*,
    error::VaultError,
    events::VaultParamsUpdated,
    state::{Registry, Vault, VaultParams},
};

/// Number of vaults a params update targets: the explicit list, or every
/// registered vault when the list is empty.
pub fn target_count(lp_mints: &[Pubkey], vault_count: u64) -> Result<usize> {
    if lp_mints.is_empty() {
        usize::try_from(vault_count).map_err(|_| error!(VaultError::MathOverflow))
    } else {
        Ok(lp_mints.len())
    }
}

/// Apply `params_for(i)` to the i-th target vault in `vaults`.
///
/// With an explicit list the i-th account must be the vault of `lp_mints[i]`;
/// with an empty list it must be the vault registered at index `i`.
pub(crate) fn update_vaults<'info>(
    registry_key: Pubkey,
    vault_count: u64,
    lp_mints: &[Pubkey],
    vaults: &[AccountInfo<'info>],
    mut params_for: impl FnMut(usize) -> VaultParams,
) -> Result<usize> {
    let count = target_count(lp_mints, vault_count)?;
    require!(vaults.len() >= count, VaultError::VaultAccountsMissing);

    for (i, info) in vaults.iter().take(count).enumerate() {
        let mut vault = Vault::load(info)?;
        require_keys_eq!(vault.registry, registry_key, VaultError::InvalidVault);
        match lp_mints.get(i) {
            Some(lp_mint) => require_keys_eq!(vault.lp_mint, *lp_mint, VaultError::InvalidVault),
            None => require!(vault.index == i as u64, VaultError::InvalidVault),
        }

        let params = params_for(i);
        vault.apply_params(&registry_key, &params)?;
        vault.store(info)?;

        emit!(VaultParamsUpdated {
            vault: info.key(),
            fee_recipient: params.fee_recipient,
            fee_enabled: params.fee_enabled,
            fee_rate_bps: params.fee_rate_bps,
            automation_interval: params.automation_interval,
        });
    }
    Ok(count)
}

/// Apply one parameter block to every listed vault (all vaults if empty).
/// Target vaults are passed, writable, as remaining accounts.
pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, SetVaultsParams<'info>>,
    lp_mints: Vec<Pubkey>,
    params: VaultParams,
) -> Result<()> {
    params.validate()?;
    let registry_key = ctx.accounts.registry.key();
    let updated = update_vaults(
        registry_key,
        ctx.accounts.registry.vault_count,
        &lp_mints,
        ctx.remaining_accounts,
        |_| params,
    )?;
    msg!("Params updated: vaults={} fee={}bps", updated, params.fee_rate_bps);
    Ok(())
}

#[derive(Accounts)]
pub struct SetVaultsParams<'info> {
    pub governor: Signer<'info>,

    #[account(
        seeds = [REGISTRY_SEED],
        bump = registry.bump,
        has_one = governor @ VaultError::Unauthorized,
    )]
    pub registry: Account<'info, Registry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_targets_every_vault() {
        assert_eq!(target_count(&[], 4).unwrap(), 4);
        assert_eq!(target_count(&[], 0).unwrap(), 0);
    }

    #[test]
    fn explicit_list_targets_listed_vaults() {
        let mints = [Pubkey::new_unique(), Pubkey::new_unique()];
        assert_eq!(target_count(&mints, 9).unwrap(), 2);
    }

    use crate::test_fixtures::{assert_vault_err, vault_at, TestAccount};

    fn params(fee_rate_bps: u16) -> VaultParams {
        VaultParams {
            fee_recipient: Pubkey::new_unique(),
            fee_enabled: true,
            fee_rate_bps,
            automation_interval: 600,
        }
    }

    #[test]
    fn every_vault_updated_in_index_order() {
        let registry = Pubkey::new_unique();
        let vaults: Vec<Vault> = (0..3).map(|i| vault_at(registry, i)).collect();
        let mut accounts: Vec<TestAccount> = vaults.iter().map(TestAccount::vault).collect();
        let infos: Vec<AccountInfo> = accounts.iter_mut().map(TestAccount::info).collect();

        let p = params(300);
        assert_eq!(update_vaults(registry, 3, &[], &infos, |_| p).unwrap(), 3);
        for info in &infos {
            assert_eq!(Vault::load(info).unwrap().params, p);
        }
    }

    #[test]
    fn listed_mint_without_its_vault_is_rejected() {
        let registry = Pubkey::new_unique();
        let vault = vault_at(registry, 0);
        let mut accounts = vec![TestAccount::vault(&vault)];
        let infos: Vec<AccountInfo> = accounts.iter_mut().map(TestAccount::info).collect();

        // a deployed vault, but for another mint
        assert_vault_err(
            update_vaults(registry, 1, &[Pubkey::new_unique()], &infos, |_| params(10)),
            VaultError::InvalidVault,
        );

        // nothing deployed at the supplied address
        let mut missing = TestAccount::missing().writable();
        assert_vault_err(
            update_vaults(registry, 1, &[vault.lp_mint], &[missing.info()], |_| params(10)),
            VaultError::InvalidVault,
        );
        assert_eq!(Vault::load(&infos[0]).unwrap().params, VaultParams::default());
    }

    #[test]
    fn empty_list_requires_vaults_at_their_own_index() {
        let registry = Pubkey::new_unique();
        let mut accounts = vec![
            TestAccount::vault(&vault_at(registry, 1)),
            TestAccount::vault(&vault_at(registry, 0)),
        ];
        let infos: Vec<AccountInfo> = accounts.iter_mut().map(TestAccount::info).collect();
        assert_vault_err(
            update_vaults(registry, 2, &[], &infos, |_| params(10)),
            VaultError::InvalidVault,
        );
    }

    #[test]
    fn foreign_registry_and_short_account_lists_are_rejected() {
        let registry = Pubkey::new_unique();
        let mut accounts = vec![TestAccount::vault(&vault_at(Pubkey::new_unique(), 0))];
        let infos: Vec<AccountInfo> = accounts.iter_mut().map(TestAccount::info).collect();
        assert_vault_err(
            update_vaults(registry, 1, &[], &infos, |_| params(10)),
            VaultError::InvalidVault,
        );
        assert_vault_err(
            update_vaults(registry, 2, &[], &infos, |_| params(10)),
            VaultError::VaultAccountsMissing,
        );
    }

    #[test]
    fn fee_cap_applies_per_vault() {
        let registry = Pubkey::new_unique();
        let mut accounts = vec![TestAccount::vault(&vault_at(registry, 0))];
        let infos: Vec<AccountInfo> = accounts.iter_mut().map(TestAccount::info).collect();
        assert_vault_err(
            update_vaults(registry, 1, &[], &infos, |_| params(MAX_FEE_BPS + 1)),
            VaultError::ExcessiveFeeValue,
        );
    }
}
