//! Low-level Anchor instruction builders.
//!
//! Each function constructs a [`solana_sdk::instruction::Instruction`] ready
//! for signing and submission.  Account order mirrors the Anchor
//! `#[derive(Accounts)]` structs in the on-chain program exactly; instructions
//! that compound first append the shared [`LiquefyAccounts`] block in place of
//! the program's nested `Liquefy` struct.
//!
//! Anchor instruction discriminators: `sha256("global:{name}")[..8]`.
//! Anchor account discriminators:    `sha256("account:{TypeName}")[..8]`.

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey,
    pubkey::Pubkey,
    system_program, sysvar,
};

use crate::state::{RouterPoolState, VaultState};

// ─── Well-known program IDs ───────────────────────────────────────────────────

pub const SPL_TOKEN_ID: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
pub const ATA_PROGRAM_ID: Pubkey = pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

// ─── PDA seeds (mirrors programs/compound-vault/src/constants.rs) ────────────

pub const REGISTRY_SEED:        &[u8] = b"registry";
pub const VAULT_INDEX_SEED:     &[u8] = b"vault_index";
pub const VAULT_SEED:           &[u8] = b"vault";
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";
pub const SHARE_SEED:           &[u8] = b"share";
pub const VAULT_LP_SEED:        &[u8] = b"vault_lp";
pub const REWARD_A_SEED:        &[u8] = b"reward_a";
pub const REWARD_B_SEED:        &[u8] = b"reward_b";

// ─── PDA derivation helpers ───────────────────────────────────────────────────

pub fn derive_registry(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[REGISTRY_SEED], program_id)
}

/// Derive the registry's list entry at `index`.
pub fn derive_vault_index(registry: &Pubkey, index: u64, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[VAULT_INDEX_SEED, registry.as_ref(), &index.to_le_bytes()],
        program_id,
    )
}

/// Derive the vault PDA for an LP mint.
pub fn derive_vault(lp_mint: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED, lp_mint.as_ref()], program_id)
}

/// Derive the authority PDA that owns the vault's token accounts.
pub fn derive_vault_authority(vault: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_AUTHORITY_SEED, vault.as_ref()], program_id)
}

/// Derive a holder's `ShareBalance` PDA.
pub fn derive_share_balance(vault: &Pubkey, owner: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[SHARE_SEED, vault.as_ref(), owner.as_ref()], program_id)
}

/// Derive the vault's `(lp, reward_a, reward_b)` token accounts.
pub fn derive_vault_token_accounts(vault: &Pubkey, program_id: &Pubkey) -> (Pubkey, Pubkey, Pubkey) {
    let pda = |seed: &[u8]| Pubkey::find_program_address(&[seed, vault.as_ref()], program_id).0;
    (pda(VAULT_LP_SEED), pda(REWARD_A_SEED), pda(REWARD_B_SEED))
}

/// Derive the Associated Token Account for a wallet + mint.
pub fn derive_ata(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[wallet.as_ref(), SPL_TOKEN_ID.as_ref(), mint.as_ref()],
        &ATA_PROGRAM_ID,
    )
    .0
}

// ─── Discriminator ────────────────────────────────────────────────────────────

pub(crate) fn disc(name: &str) -> [u8; 8] {
    let h = solana_sdk::hash::hash(format!("global:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&h.to_bytes()[..8]);
    out
}

fn push_pubkeys(data: &mut Vec<u8>, keys: &[Pubkey]) {
    data.extend_from_slice(&(keys.len() as u32).to_le_bytes());
    for k in keys {
        data.extend_from_slice(k.as_ref());
    }
}

// ─── Shared compounding accounts ──────────────────────────────────────────────

/// Accounts of the program's `Liquefy` block, resolved from vault + pool state.
#[derive(Debug, Clone)]
pub struct LiquefyAccounts {
    pub vault_lp_account:         Pubkey,
    pub reward_a_account:         Pubkey,
    pub reward_b_account:         Pubkey,
    pub fee_recipient_lp_account: Pubkey,
    pub lp_mint:                  Pubkey,
    pub router_program:           Pubkey,
    pub router_pool:              Pubkey,
    pub pool_token_a:             Pubkey,
    pub pool_token_b:             Pubkey,
}

impl LiquefyAccounts {
    /// The fee recipient's LP account is its associated token account.
    pub fn resolve(vault: &VaultState, pool: &RouterPoolState) -> Self {
        Self {
            vault_lp_account:         vault.lp_account,
            reward_a_account:         vault.reward_a_account,
            reward_b_account:         vault.reward_b_account,
            fee_recipient_lp_account: derive_ata(&vault.fee_recipient, &vault.lp_mint),
            lp_mint:                  vault.lp_mint,
            router_program:           vault.router_program,
            router_pool:              vault.router_pool,
            pool_token_a:             pool.token_a,
            pool_token_b:             pool.token_b,
        }
    }

    fn metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.vault_lp_account,         false),
            AccountMeta::new(self.reward_a_account,         false),
            AccountMeta::new(self.reward_b_account,         false),
            AccountMeta::new(self.fee_recipient_lp_account, false),
            AccountMeta::new(self.lp_mint,                  false),  // router mints into vault_lp
            AccountMeta::new_readonly(self.router_program,  false),
            AccountMeta::new(self.router_pool,              false),
            AccountMeta::new(self.pool_token_a,             false),
            AccountMeta::new(self.pool_token_b,             false),
            AccountMeta::new_readonly(SPL_TOKEN_ID,         false),
        ]
    }
}

// ─── Registry ─────────────────────────────────────────────────────────────────

pub fn initialize_registry_ix(program_id: &Pubkey, payer: &Pubkey, governor: &Pubkey) -> Instruction {
    let (registry, _) = derive_registry(program_id);
    let mut data = disc("initialize_registry").to_vec();
    data.extend_from_slice(governor.as_ref());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer,   true),    // mut + signer
            AccountMeta::new(registry, false),   // mut PDA (init)
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data,
    }
}

pub fn set_governor_ix(program_id: &Pubkey, governor: &Pubkey, new_governor: &Pubkey) -> Instruction {
    let (registry, _) = derive_registry(program_id);
    let mut data = disc("set_governor").to_vec();
    data.extend_from_slice(new_governor.as_ref());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*governor, true),
            AccountMeta::new(registry,           false),
        ],
        data,
    }
}

/// Arguments of `deploy_vault`.
#[derive(Debug, Clone)]
pub struct DeployArgs {
    pub fee_recipient:         Pubkey,
    pub fee_enabled:           bool,
    pub fee_rate_bps:          u16,
    pub automation_interval:   i64,
    pub initialization_amount: u64,
    pub symbol:                String,
}

/// Build `deploy_vault`. `vault_count` is the registry's current count; the
/// new vault takes that index.
#[allow(clippy::too_many_arguments)]
pub fn deploy_vault_ix(
    program_id:             &Pubkey,
    governor:               &Pubkey,
    initializer:            &Pubkey,
    vault_count:            u64,
    pool:                   &RouterPoolState,
    router_program:         &Pubkey,
    router_pool:            &Pubkey,
    initializer_lp_account: &Pubkey,
    args:                   &DeployArgs,
) -> Instruction {
    let (registry, _)        = derive_registry(program_id);
    let (vault, _)           = derive_vault(&pool.lp_mint, program_id);
    let (vault_authority, _) = derive_vault_authority(&vault, program_id);
    let (vault_index, _)     = derive_vault_index(&registry, vault_count, program_id);
    let (vault_lp, reward_a, reward_b) = derive_vault_token_accounts(&vault, program_id);
    let (share, _)           = derive_share_balance(&vault, initializer, program_id);

    let mut data = disc("deploy_vault").to_vec();
    data.extend_from_slice(args.fee_recipient.as_ref());
    data.push(args.fee_enabled as u8);
    data.extend_from_slice(&args.fee_rate_bps.to_le_bytes());
    data.extend_from_slice(&args.automation_interval.to_le_bytes());
    data.extend_from_slice(&args.initialization_amount.to_le_bytes());
    data.extend_from_slice(&(args.symbol.len() as u32).to_le_bytes());
    data.extend_from_slice(args.symbol.as_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*governor,                 true),   // mut + signer (payer)
            AccountMeta::new_readonly(*initializer,     true),
            AccountMeta::new(registry,                  false),  // mut (vault_count)
            AccountMeta::new_readonly(pool.lp_mint,     false),
            AccountMeta::new_readonly(pool.mint_a,      false),
            AccountMeta::new_readonly(pool.mint_b,      false),
            AccountMeta::new_readonly(*router_program,  false),
            AccountMeta::new_readonly(*router_pool,     false),
            AccountMeta::new(vault,                     false),  // mut PDA (init)
            AccountMeta::new_readonly(vault_authority,  false),
            AccountMeta::new(vault_index,               false),  // mut PDA (init)
            AccountMeta::new(vault_lp,                  false),  // mut PDA (init)
            AccountMeta::new(reward_a,                  false),  // mut PDA (init)
            AccountMeta::new(reward_b,                  false),  // mut PDA (init)
            AccountMeta::new(*initializer_lp_account,   false),  // mut
            AccountMeta::new(share,                     false),  // mut PDA (init)
            AccountMeta::new_readonly(SPL_TOKEN_ID,     false),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(sysvar::rent::ID, false),
        ],
        data,
    }
}

/// Parameter block shared by `set_vaults_params` and the SDK's helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamsArgs {
    pub fee_recipient:       Pubkey,
    pub fee_enabled:         bool,
    pub fee_rate_bps:        u16,
    pub automation_interval: i64,
}

fn governor_metas(program_id: &Pubkey, governor: &Pubkey, vaults: &[Pubkey]) -> Vec<AccountMeta> {
    let (registry, _) = derive_registry(program_id);
    let mut accounts = vec![
        AccountMeta::new_readonly(*governor, true),
        AccountMeta::new_readonly(registry,  false),
    ];
    // remaining accounts: target vaults, writable, in target order
    accounts.extend(vaults.iter().map(|v| AccountMeta::new(*v, false)));
    accounts
}

/// `lp_mints` empty means every registered vault; `vaults` must then be all
/// vaults in index order.
pub fn set_vaults_params_ix(
    program_id: &Pubkey,
    governor:   &Pubkey,
    lp_mints:   &[Pubkey],
    vaults:     &[Pubkey],
    params:     &ParamsArgs,
) -> Instruction {
    let mut data = disc("set_vaults_params").to_vec();
    push_pubkeys(&mut data, lp_mints);
    data.extend_from_slice(params.fee_recipient.as_ref());
    data.push(params.fee_enabled as u8);
    data.extend_from_slice(&params.fee_rate_bps.to_le_bytes());
    data.extend_from_slice(&params.automation_interval.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: governor_metas(program_id, governor, vaults),
        data,
    }
}

/// Per-vault parameters, one entry per target.
pub fn set_vaults_params_batch_ix(
    program_id: &Pubkey,
    governor:   &Pubkey,
    lp_mints:   &[Pubkey],
    vaults:     &[Pubkey],
    params:     &[ParamsArgs],
) -> Instruction {
    let mut data = disc("set_vaults_params_batch").to_vec();
    push_pubkeys(&mut data, lp_mints);
    let recipients: Vec<Pubkey> = params.iter().map(|p| p.fee_recipient).collect();
    push_pubkeys(&mut data, &recipients);
    data.extend_from_slice(&(params.len() as u32).to_le_bytes());
    data.extend(params.iter().map(|p| p.fee_enabled as u8));
    data.extend_from_slice(&(params.len() as u32).to_le_bytes());
    for p in params {
        data.extend_from_slice(&p.fee_rate_bps.to_le_bytes());
    }
    data.extend_from_slice(&(params.len() as u32).to_le_bytes());
    for p in params {
        data.extend_from_slice(&p.automation_interval.to_le_bytes());
    }

    Instruction {
        program_id: *program_id,
        accounts: governor_metas(program_id, governor, vaults),
        data,
    }
}

// ─── Holder operations ────────────────────────────────────────────────────────

fn vault_head(program_id: &Pubkey, vault: &Pubkey) -> [AccountMeta; 2] {
    let (vault_authority, _) = derive_vault_authority(vault, program_id);
    [
        AccountMeta::new(*vault,                    false),  // mut
        AccountMeta::new_readonly(vault_authority,  false),
    ]
}

pub fn stake_ix(
    program_id:   &Pubkey,
    depositor:    &Pubkey,
    vault:        &Pubkey,
    depositor_lp: &Pubkey,
    liquefy:      &LiquefyAccounts,
    amount:       u64,
) -> Instruction {
    let (share, _) = derive_share_balance(vault, depositor, program_id);
    let mut data = disc("stake").to_vec();
    data.extend_from_slice(&amount.to_le_bytes());

    let mut accounts = vec![AccountMeta::new(*depositor, true)];   // mut + signer
    accounts.extend(vault_head(program_id, vault));
    accounts.push(AccountMeta::new(share,         false));         // mut PDA (init_if_needed)
    accounts.push(AccountMeta::new(*depositor_lp, false));         // mut
    accounts.extend(liquefy.metas());
    accounts.push(AccountMeta::new_readonly(system_program::ID, false));

    Instruction { program_id: *program_id, accounts, data }
}

/// `relayer` pays fees and rent; `owner` co-signs the one-shot approval.
#[allow(clippy::too_many_arguments)]
pub fn stake_with_permit_ix(
    program_id: &Pubkey,
    relayer:    &Pubkey,
    owner:      &Pubkey,
    vault:      &Pubkey,
    owner_lp:   &Pubkey,
    liquefy:    &LiquefyAccounts,
    amount:     u64,
    deadline:   i64,
) -> Instruction {
    let (share, _) = derive_share_balance(vault, owner, program_id);
    let mut data = disc("stake_with_permit").to_vec();
    data.extend_from_slice(&amount.to_le_bytes());
    data.extend_from_slice(&deadline.to_le_bytes());

    let mut accounts = vec![
        AccountMeta::new(*relayer,         true),   // mut + signer
        AccountMeta::new_readonly(*owner,  true),
    ];
    accounts.extend(vault_head(program_id, vault));
    accounts.push(AccountMeta::new(share,     false));
    accounts.push(AccountMeta::new(*owner_lp, false));
    accounts.extend(liquefy.metas());
    accounts.push(AccountMeta::new_readonly(system_program::ID, false));

    Instruction { program_id: *program_id, accounts, data }
}

pub fn withdraw_ix(
    program_id:       &Pubkey,
    owner:            &Pubkey,
    vault:            &Pubkey,
    vault_lp_account: &Pubkey,
    owner_lp:         &Pubkey,
    units:            u64,
) -> Instruction {
    let (share, _) = derive_share_balance(vault, owner, program_id);
    let mut data = disc("withdraw").to_vec();
    data.extend_from_slice(&units.to_le_bytes());

    let mut accounts = vec![AccountMeta::new_readonly(*owner, true)];
    accounts.extend(vault_head(program_id, vault));
    accounts.extend([
        AccountMeta::new(share,             false),
        AccountMeta::new(*vault_lp_account, false),
        AccountMeta::new(*owner_lp,         false),
        AccountMeta::new_readonly(SPL_TOKEN_ID, false),
    ]);

    Instruction { program_id: *program_id, accounts, data }
}

pub fn exit_ix(
    program_id: &Pubkey,
    owner:      &Pubkey,
    vault:      &Pubkey,
    owner_lp:   &Pubkey,
    liquefy:    &LiquefyAccounts,
) -> Instruction {
    let (share, _) = derive_share_balance(vault, owner, program_id);

    let mut accounts = vec![AccountMeta::new_readonly(*owner, true)];
    accounts.extend(vault_head(program_id, vault));
    accounts.push(AccountMeta::new(share,     false));
    accounts.push(AccountMeta::new(*owner_lp, false));
    accounts.extend(liquefy.metas());

    Instruction { program_id: *program_id, accounts, data: disc("exit").to_vec() }
}

pub fn transfer_units_ix(
    program_id: &Pubkey,
    sender:     &Pubkey,
    recipient:  &Pubkey,
    vault:      &Pubkey,
    units:      u64,
) -> Instruction {
    let (from, _) = derive_share_balance(vault, sender, program_id);
    let (to, _)   = derive_share_balance(vault, recipient, program_id);
    let mut data = disc("transfer_units").to_vec();
    data.extend_from_slice(&units.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*sender,             true),   // mut + signer (payer)
            AccountMeta::new_readonly(*recipient, false),
            AccountMeta::new_readonly(*vault,     false),
            AccountMeta::new(from,                false),
            AccountMeta::new(to,                  false),  // mut PDA (init_if_needed)
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data,
    }
}

// ─── Compounding / keeper ─────────────────────────────────────────────────────

pub fn compound_ix(program_id: &Pubkey, vault: &Pubkey, liquefy: &LiquefyAccounts) -> Instruction {
    let mut accounts = vault_head(program_id, vault).to_vec();
    accounts.extend(liquefy.metas());
    Instruction { program_id: *program_id, accounts, data: disc("compound").to_vec() }
}

/// `probes` are `(vault, reward_a_account, reward_b_account)` for each index
/// of the range, in order.
pub fn check_work_ix(
    program_id:  &Pubkey,
    start_index: u64,
    end_index:   u64,
    probes:      &[(Pubkey, Pubkey, Pubkey)],
) -> Instruction {
    let (registry, _) = derive_registry(program_id);
    let mut data = disc("check_work").to_vec();
    data.extend_from_slice(&start_index.to_le_bytes());
    data.extend_from_slice(&end_index.to_le_bytes());

    let mut accounts = vec![AccountMeta::new_readonly(registry, false)];
    for (vault, a, b) in probes {
        accounts.push(AccountMeta::new_readonly(*vault, false));
        accounts.push(AccountMeta::new_readonly(*a,     false));
        accounts.push(AccountMeta::new_readonly(*b,     false));
    }
    Instruction { program_id: *program_id, accounts, data }
}

pub fn perform_work_ix(
    program_id:   &Pubkey,
    vault:        &Pubkey,
    liquefy:      &LiquefyAccounts,
    perform_data: &[u8],
) -> Instruction {
    let (registry, _) = derive_registry(program_id);
    let mut data = disc("perform_work").to_vec();
    data.extend_from_slice(&(perform_data.len() as u32).to_le_bytes());
    data.extend_from_slice(perform_data);

    let mut accounts = vec![AccountMeta::new_readonly(registry, false)];
    accounts.extend(vault_head(program_id, vault));
    accounts.extend(liquefy.metas());
    Instruction { program_id: *program_id, accounts, data }
}

pub fn needs_compounding_ix(program_id: &Pubkey, vault: &VaultState, vault_key: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*vault_key,             false),
            AccountMeta::new_readonly(vault.reward_a_account, false),
            AccountMeta::new_readonly(vault.reward_b_account, false),
        ],
        data: disc("needs_compounding").to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminator_is_anchor_sighash() {
        assert_eq!(disc("add_liquidity"), [181, 157, 89, 67, 143, 182, 52, 72]);
        assert_ne!(disc("stake"), disc("stake_with_permit"));
    }

    #[test]
    fn vault_pdas_are_per_mint() {
        let program_id = Pubkey::new_unique();
        let (m1, m2) = (Pubkey::new_unique(), Pubkey::new_unique());
        let (v1, _) = derive_vault(&m1, &program_id);
        let (v2, _) = derive_vault(&m2, &program_id);
        assert_ne!(v1, v2);
        let (lp, a, b) = derive_vault_token_accounts(&v1, &program_id);
        assert!(lp != a && a != b && lp != b);
    }

    #[test]
    fn index_pda_depends_on_position() {
        let program_id = Pubkey::new_unique();
        let (registry, _) = derive_registry(&program_id);
        assert_ne!(
            derive_vault_index(&registry, 0, &program_id).0,
            derive_vault_index(&registry, 1, &program_id).0
        );
    }

    #[test]
    fn perform_work_carries_length_prefixed_payload() {
        let program_id = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let liquefy = LiquefyAccounts {
            vault_lp_account:         Pubkey::new_unique(),
            reward_a_account:         Pubkey::new_unique(),
            reward_b_account:         Pubkey::new_unique(),
            fee_recipient_lp_account: Pubkey::new_unique(),
            lp_mint:                  mint,
            router_program:           Pubkey::new_unique(),
            router_pool:              Pubkey::new_unique(),
            pool_token_a:             Pubkey::new_unique(),
            pool_token_b:             Pubkey::new_unique(),
        };
        let (vault, _) = derive_vault(&mint, &program_id);
        let ix = perform_work_ix(&program_id, &vault, &liquefy, mint.as_ref());
        assert_eq!(&ix.data[8..12], &32u32.to_le_bytes());
        assert_eq!(&ix.data[12..], mint.as_ref());
        // registry + vault + authority + 10 liquefy accounts
        assert_eq!(ix.accounts.len(), 13);
        assert!(ix.accounts[1].is_writable);
    }

    #[test]
    fn batch_params_encode_parallel_vectors() {
        let program_id = Pubkey::new_unique();
        let params = [
            ParamsArgs { fee_recipient: Pubkey::new_unique(), fee_enabled: true, fee_rate_bps: 200, automation_interval: 60 },
            ParamsArgs { fee_recipient: Pubkey::new_unique(), fee_enabled: false, fee_rate_bps: 0, automation_interval: 0 },
        ];
        let ix = set_vaults_params_batch_ix(&program_id, &Pubkey::new_unique(), &[], &[], &params);
        // disc + empty mints + 2 recipients + 2 bools + 2 u16 + 2 i64
        assert_eq!(ix.data.len(), 8 + 4 + (4 + 64) + (4 + 2) + (4 + 4) + (4 + 16));
    }
}
