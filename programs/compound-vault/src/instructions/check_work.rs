use anchor_lang::prelude::*;
use anchor_spl::token::TokenAccount;
use crate::{constants::*, error::VaultError, state::{Registry, Vault}};

/// Result of a discovery scan. `perform_data` is the LP mint of the first
/// vault needing work, empty otherwise.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckWorkResult {
    pub upkeep_needed: bool,
    pub perform_data: Vec<u8>,
}

/// Walk `start..end` in order and stop at the first index `probe` flags.
pub fn scan_range(
    start: u64,
    end: u64,
    mut probe: impl FnMut(u64) -> Result<Option<Pubkey>>,
) -> Result<CheckWorkResult> {
    for index in start..end {
        if let Some(lp_mint) = probe(index)? {
            return Ok(CheckWorkResult {
                upkeep_needed: true,
                perform_data: lp_mint.to_bytes().to_vec(),
            });
        }
    }
    Ok(CheckWorkResult::default())
}

fn token_amount(info: &AccountInfo, expected: &Pubkey) -> Result<u64> {
    require_keys_eq!(info.key(), *expected, VaultError::InvalidVault);
    let data = info.try_borrow_data()?;
    Ok(TokenAccount::try_deserialize(&mut &data[..])?.amount)
}

/// Walk the remaining accounts of a `check_work` call.
///
/// `accounts` holds `(vault, reward_a_account, reward_b_account)` for each
/// index in `start_index..min(end_index, vault_count)`.
pub(crate) fn scan_accounts(
    registry: &Registry,
    registry_key: Pubkey,
    start_index: u64,
    end_index: u64,
    accounts: &[AccountInfo],
    now: i64,
) -> Result<CheckWorkResult> {
    let end = registry.clamp_end(end_index);
    scan_range(start_index, end, |index| {
        let base = usize::try_from(index - start_index)
            .map_err(|_| error!(VaultError::MathOverflow))?
            .checked_mul(ACCOUNTS_PER_PROBE)
            .ok_or(VaultError::MathOverflow)?;
        let entry = accounts
            .get(base..base + ACCOUNTS_PER_PROBE)
            .ok_or(VaultError::VaultAccountsMissing)?;

        let vault = Vault::load(&entry[0])?;
        require_keys_eq!(vault.registry, registry_key, VaultError::InvalidVault);
        require!(vault.index == index, VaultError::InvalidVault);
        let reward_a = token_amount(&entry[1], &vault.reward_a_account)?;
        let reward_b = token_amount(&entry[2], &vault.reward_b_account)?;

        Ok(vault
            .needs_compounding(reward_a, reward_b, now)
            .then_some(vault.lp_mint))
    })
}

/// Read-only scan for a vault whose rewards are ready to compound.
pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, CheckWork<'info>>,
    start_index: u64,
    end_index: u64,
) -> Result<CheckWorkResult> {
    let now = Clock::get()?.unix_timestamp;
    let registry = &ctx.accounts.registry;
    let result = scan_accounts(
        registry,
        registry.key(),
        start_index,
        end_index,
        ctx.remaining_accounts,
        now,
    )?;
    msg!(
        "check_work [{}, {}): upkeep_needed={}",
        start_index,
        registry.clamp_end(end_index),
        result.upkeep_needed
    );
    Ok(result)
}

#[derive(Accounts)]
pub struct CheckWork<'info> {
    #[account(seeds = [REGISTRY_SEED], bump = registry.bump)]
    pub registry: Account<'info, Registry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_range_needs_nothing() {
        let r = scan_range(5, 5, |_| panic!("no index should be probed")).unwrap();
        assert_eq!(r, CheckWorkResult::default());
        let r = scan_range(7, 3, |_| panic!("no index should be probed")).unwrap();
        assert!(!r.upkeep_needed);
    }

    #[test]
    fn first_match_wins_and_scan_stops() {
        let mints: Vec<Pubkey> = (0..6).map(|_| Pubkey::new_unique()).collect();
        let mut probed = Vec::new();
        let r = scan_range(1, 6, |i| {
            probed.push(i);
            Ok((i == 3 || i == 4).then_some(mints[i as usize]))
        })
        .unwrap();
        assert!(r.upkeep_needed);
        assert_eq!(r.perform_data, mints[3].to_bytes().to_vec());
        assert_eq!(probed, vec![1, 2, 3]);
    }

    #[test]
    fn no_match_returns_empty_payload() {
        let r = scan_range(0, 4, |_| Ok(None)).unwrap();
        assert!(!r.upkeep_needed);
        assert!(r.perform_data.is_empty());
    }

    #[test]
    fn probe_errors_propagate() {
        let r = scan_range(0, 2, |_| err!(VaultError::VaultAccountsMissing));
        assert!(r.is_err());
    }

    use crate::test_fixtures::{assert_vault_err, vault_at, TestAccount};

    const NOW: i64 = 10_000;

    /// `(vault, reward_a, reward_b)` storage for indices `0..n` of `registry`.
    fn registered(registry: Pubkey, rewards: &[(u64, u64)]) -> (Vec<Vault>, Vec<TestAccount>) {
        let mut vaults = Vec::new();
        let mut accounts = Vec::new();
        for (i, (a, b)) in rewards.iter().enumerate() {
            let vault = vault_at(registry, i as u64);
            accounts.push(TestAccount::vault(&vault));
            accounts.push(TestAccount::token(vault.reward_a_mint, Pubkey::new_unique(), *a).at(vault.reward_a_account));
            accounts.push(TestAccount::token(vault.reward_b_mint, Pubkey::new_unique(), *b).at(vault.reward_b_account));
            vaults.push(vault);
        }
        (vaults, accounts)
    }

    fn registry_of(count: u64) -> Registry {
        Registry { vault_count: count, ..Registry::default() }
    }

    #[test]
    fn walk_reports_first_funded_vault() {
        let key = Pubkey::new_unique();
        let (vaults, mut accounts) = registered(key, &[(5, 0), (3, 4), (9, 9)]);
        let infos: Vec<AccountInfo> = accounts.iter_mut().map(TestAccount::info).collect();

        let r = scan_accounts(&registry_of(3), key, 0, 3, &infos, NOW).unwrap();
        assert!(r.upkeep_needed);
        assert_eq!(r.perform_data, vaults[1].lp_mint.to_bytes().to_vec());

        // a range starting at 2 takes its accounts from the front of the list
        let r = scan_accounts(&registry_of(3), key, 2, 3, &infos[6..], NOW).unwrap();
        assert!(r.upkeep_needed);
        assert_eq!(r.perform_data, vaults[2].lp_mint.to_bytes().to_vec());
    }

    #[test]
    fn walk_needs_accounts_for_every_index_in_range() {
        let key = Pubkey::new_unique();
        let (_, mut accounts) = registered(key, &[(0, 0), (0, 0)]);
        let infos: Vec<AccountInfo> = accounts.iter_mut().map(TestAccount::info).collect();

        assert_vault_err(
            scan_accounts(&registry_of(3), key, 0, 3, &infos, NOW),
            VaultError::VaultAccountsMissing,
        );
        assert_vault_err(
            scan_accounts(&registry_of(2), key, 0, 2, &infos[..5], NOW),
            VaultError::VaultAccountsMissing,
        );
    }

    #[test]
    fn walk_end_is_clamped_to_vault_count() {
        let key = Pubkey::new_unique();
        let (_, mut accounts) = registered(key, &[(0, 1), (1, 0)]);
        let infos: Vec<AccountInfo> = accounts.iter_mut().map(TestAccount::info).collect();

        let r = scan_accounts(&registry_of(2), key, 0, u64::MAX, &infos, NOW).unwrap();
        assert_eq!(r, CheckWorkResult::default());
        let r = scan_accounts(&registry_of(2), key, 5, 9, &[], NOW).unwrap();
        assert_eq!(r, CheckWorkResult::default());
    }

    #[test]
    fn walk_rejects_vaults_at_the_wrong_index() {
        let key = Pubkey::new_unique();
        let (_, mut accounts) = registered(key, &[(1, 1), (1, 1)]);
        let infos: Vec<AccountInfo> = accounts.iter_mut().map(TestAccount::info).collect();

        // index 1's vault supplied where index 0 is expected
        assert_vault_err(
            scan_accounts(&registry_of(2), key, 0, 1, &infos[3..], NOW),
            VaultError::InvalidVault,
        );
        // same accounts, but the range says they belong to index 1
        assert!(scan_accounts(&registry_of(2), key, 1, 2, &infos[3..], NOW).unwrap().upkeep_needed);
    }

    #[test]
    fn walk_rejects_foreign_vaults_and_reward_accounts() {
        let key = Pubkey::new_unique();
        let (_, mut accounts) = registered(Pubkey::new_unique(), &[(1, 1)]);
        let infos: Vec<AccountInfo> = accounts.iter_mut().map(TestAccount::info).collect();
        assert_vault_err(scan_accounts(&registry_of(1), key, 0, 1, &infos, NOW), VaultError::InvalidVault);

        let (vaults, mut accounts) = registered(key, &[(1, 1)]);
        accounts[2] = TestAccount::token(vaults[0].reward_b_mint, Pubkey::new_unique(), 1);
        let infos: Vec<AccountInfo> = accounts.iter_mut().map(TestAccount::info).collect();
        assert_vault_err(scan_accounts(&registry_of(1), key, 0, 1, &infos, NOW), VaultError::InvalidVault);

        // not owned by this program
        let mut stray = TestAccount::new(Pubkey::new_unique(), accounts[0].data.clone());
        let mut rest: Vec<AccountInfo> = accounts[1..].iter_mut().map(TestAccount::info).collect();
        rest.insert(0, stray.info());
        assert_vault_err(scan_accounts(&registry_of(1), key, 0, 1, &rest, NOW), VaultError::InvalidVault);
    }
}
