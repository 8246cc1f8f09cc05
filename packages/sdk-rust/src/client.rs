//! [`VaultClient`], the main entry point for depositors, governors and keepers.

use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSimulateTransactionConfig},
    rpc_filter::{Memcmp, MemcmpEncodedBytes, RpcFilterType},
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::hash,
    instruction::Instruction,
    message::Message,
    pubkey,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    sysvar,
    transaction::Transaction,
};

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{
    error::{Error, Result},
    instructions::{
        check_work_ix, compound_ix, deploy_vault_ix, derive_ata, derive_registry,
        derive_share_balance, derive_vault, derive_vault_index, derive_vault_token_accounts,
        exit_ix, initialize_registry_ix, needs_compounding_ix, perform_work_ix,
        set_governor_ix, set_vaults_params_batch_ix, set_vaults_params_ix, stake_ix,
        stake_with_permit_ix, transfer_units_ix, withdraw_ix, DeployArgs, LiquefyAccounts,
        ParamsArgs,
    },
    math::{
        assets_for_units, is_locked, needs_compounding, redemption_rate, units_for_deposit,
        unlock_at,
    },
    state::{
        parse_bool_return, parse_check_work_return, parse_clock_timestamp, parse_registry, parse_router_pool, parse_share_balance,
        parse_token_amount, parse_vault, parse_vault_index, RegistryState, VaultState,
        SHARE_BALANCE_LEN, SHARE_BALANCE_OWNER_OFFSET,
    },
    types::{
        CheckWorkOutcome, DeployResult, PositionInfo, RegistryInfo, StakeResult, TxResult,
        VaultInfo, WithdrawResult,
    },
};

// ─── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_PROGRAM_ID: Pubkey = pubkey!("3qiDvpsFpHvgRR2RAPcVJrJK8f3CdTUcAye3C3YM7Abi");
const DEVNET_RPC:  &str = "https://api.devnet.solana.com";
const MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";

/// `getMultipleAccounts` accepts at most 100 keys per call.
const MULTIPLE_ACCOUNTS_CHUNK: usize = 100;

/// Vault indices per simulated `check_work`. Each adds three accounts, and
/// the whole message has to fit in one transaction.
const CHECK_WORK_BATCH: u64 = 8;

// ─── Client ───────────────────────────────────────────────────────────────────

/// Async Compound Vault client for Solana.
///
/// ```rust,no_run
/// # use compound_vault_sdk::VaultClient;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = VaultClient::devnet();
/// # let keeper = solana_sdk::pubkey::Pubkey::new_unique();
/// let work = client.check_work(&keeper, 0, 50).await?;
/// if let Some(mint) = work.lp_mint {
///     println!("vault for {mint} needs compounding");
/// }
/// # Ok(())
/// # }
/// ```
pub struct VaultClient {
    rpc_url:    String,
    program_id: Pubkey,
}

impl VaultClient {
    /// Create a client pointing at any RPC endpoint.
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self { rpc_url: rpc_url.into(), program_id: DEFAULT_PROGRAM_ID }
    }

    /// Pre-configured client for Solana devnet.
    pub fn devnet() -> Self {
        Self::new(DEVNET_RPC)
    }

    /// Pre-configured client for Solana mainnet-beta.
    pub fn mainnet() -> Self {
        Self::new(MAINNET_RPC)
    }

    /// Override the program ID (useful for locally deployed programs in tests).
    pub fn with_program_id(mut self, program_id: Pubkey) -> Self {
        self.program_id = program_id;
        self
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    // ── Governance ────────────────────────────────────────────────────────────

    pub async fn initialize_registry(&self, payer: &Keypair, governor: Pubkey) -> Result<String> {
        let rpc = self.rpc();
        let ix = initialize_registry_ix(&self.program_id, &payer.pubkey(), &governor);
        Ok(self.sign_and_send(&rpc, &[ix], payer, &[]).await?.to_string())
    }

    pub async fn set_governor(&self, governor: &Keypair, new_governor: Pubkey) -> Result<String> {
        let rpc = self.rpc();
        let ix = set_governor_ix(&self.program_id, &governor.pubkey(), &new_governor);
        Ok(self.sign_and_send(&rpc, &[ix], governor, &[]).await?.to_string())
    }

    /// Deploy the vault for the LP mint issued by `router_pool`.
    ///
    /// The initializer's LP is taken from its associated token account.
    pub async fn deploy_vault(
        &self,
        governor:       &Keypair,
        initializer:    &Keypair,
        router_program: Pubkey,
        router_pool:    Pubkey,
        args:           DeployArgs,
    ) -> Result<DeployResult> {
        if args.symbol.len() > 16 {
            return Err(Error::InvalidArgument(format!(
                "symbol '{}' is longer than 16 bytes",
                args.symbol
            )));
        }
        let rpc = self.rpc();
        let registry = self.fetch_registry(&rpc).await?;
        let pool = parse_router_pool(&rpc.get_account_data(&router_pool).await?)?;
        let initializer_lp = derive_ata(&initializer.pubkey(), &pool.lp_mint);

        let ix = deploy_vault_ix(
            &self.program_id,
            &governor.pubkey(),
            &initializer.pubkey(),
            registry.vault_count,
            &pool,
            &router_program,
            &router_pool,
            &initializer_lp,
            &args,
        );
        let extra: Vec<&Keypair> = if initializer.pubkey() == governor.pubkey() {
            vec![]
        } else {
            vec![initializer]
        };
        let sig = self.sign_and_send(&rpc, &[ix], governor, &extra).await?;

        Ok(DeployResult {
            signature: sig.to_string(),
            vault:     derive_vault(&pool.lp_mint, &self.program_id).0,
            lp_mint:   pool.lp_mint,
            index:     registry.vault_count,
        })
    }

    /// Apply one parameter block to the vaults of `lp_mints`, or to every
    /// vault when `lp_mints` is empty.
    pub async fn set_params(
        &self,
        governor: &Keypair,
        lp_mints: &[Pubkey],
        params:   ParamsArgs,
    ) -> Result<String> {
        let rpc = self.rpc();
        let vaults = self.target_vaults(&rpc, lp_mints).await?;
        let ix = set_vaults_params_ix(&self.program_id, &governor.pubkey(), lp_mints, &vaults, &params);
        Ok(self.sign_and_send(&rpc, &[ix], governor, &[]).await?.to_string())
    }

    /// Per-vault parameters; `params[i]` goes to the i-th target.
    pub async fn set_params_batch(
        &self,
        governor: &Keypair,
        lp_mints: &[Pubkey],
        params:   &[ParamsArgs],
    ) -> Result<String> {
        let rpc = self.rpc();
        let vaults = self.target_vaults(&rpc, lp_mints).await?;
        if params.len() != vaults.len() {
            return Err(Error::InvalidArgument(format!(
                "{} parameter blocks for {} vaults",
                params.len(),
                vaults.len()
            )));
        }
        let ix = set_vaults_params_batch_ix(&self.program_id, &governor.pubkey(), lp_mints, &vaults, params);
        Ok(self.sign_and_send(&rpc, &[ix], governor, &[]).await?.to_string())
    }

    // ── Holder operations ─────────────────────────────────────────────────────

    /// Stake `amount` LP from the owner's associated token account.
    pub async fn stake(&self, owner: &Keypair, lp_mint: Pubkey, amount: u64) -> Result<StakeResult> {
        let rpc = self.rpc();
        let (vault_addr, vault) = self.fetch_vault(&rpc, &lp_mint).await?;
        let liquefy = self.liquefy_accounts(&rpc, &vault).await?;
        let estimated_units = self.estimate_units(&rpc, &vault, amount).await?;

        let owner_lp = derive_ata(&owner.pubkey(), &lp_mint);
        let ix = stake_ix(&self.program_id, &owner.pubkey(), &vault_addr, &owner_lp, &liquefy, amount);
        let sig = self.sign_and_send(&rpc, &[ix], owner, &[]).await?;

        Ok(StakeResult { signature: sig.to_string(), vault: vault_addr, amount, estimated_units })
    }

    /// Relayed stake: `relayer` pays, `owner` only co-signs.
    pub async fn stake_with_permit(
        &self,
        relayer:  &Keypair,
        owner:    &Keypair,
        lp_mint:  Pubkey,
        amount:   u64,
        deadline: i64,
    ) -> Result<StakeResult> {
        let rpc = self.rpc();
        let (vault_addr, vault) = self.fetch_vault(&rpc, &lp_mint).await?;
        let liquefy = self.liquefy_accounts(&rpc, &vault).await?;
        let estimated_units = self.estimate_units(&rpc, &vault, amount).await?;

        let owner_lp = derive_ata(&owner.pubkey(), &lp_mint);
        let ix = stake_with_permit_ix(
            &self.program_id,
            &relayer.pubkey(),
            &owner.pubkey(),
            &vault_addr,
            &owner_lp,
            &liquefy,
            amount,
            deadline,
        );
        let sig = self.sign_and_send(&rpc, &[ix], relayer, &[owner]).await?;

        Ok(StakeResult { signature: sig.to_string(), vault: vault_addr, amount, estimated_units })
    }

    pub async fn withdraw(&self, owner: &Keypair, lp_mint: Pubkey, units: u64) -> Result<WithdrawResult> {
        let rpc = self.rpc();
        let (vault_addr, vault) = self.fetch_vault(&rpc, &lp_mint).await?;
        let lp_balance = parse_token_amount(&rpc.get_account_data(&vault.lp_account).await?)?;
        let estimated_amount = assets_for_units(units, lp_balance, vault.total_supply)?;

        let owner_lp = derive_ata(&owner.pubkey(), &lp_mint);
        let ix = withdraw_ix(&self.program_id, &owner.pubkey(), &vault_addr, &vault.lp_account, &owner_lp, units);
        let sig = self.sign_and_send(&rpc, &[ix], owner, &[]).await?;

        Ok(WithdrawResult { signature: sig.to_string(), vault: vault_addr, units, estimated_amount })
    }

    /// Compound, then withdraw the owner's whole balance.
    pub async fn exit(&self, owner: &Keypair, lp_mint: Pubkey) -> Result<WithdrawResult> {
        let rpc = self.rpc();
        let (vault_addr, vault) = self.fetch_vault(&rpc, &lp_mint).await?;
        let position = self.position_inner(&rpc, &vault_addr, &vault, &owner.pubkey()).await?;
        let liquefy = self.liquefy_accounts(&rpc, &vault).await?;

        let owner_lp = derive_ata(&owner.pubkey(), &lp_mint);
        let ix = exit_ix(&self.program_id, &owner.pubkey(), &vault_addr, &owner_lp, &liquefy);
        let sig = self.sign_and_send(&rpc, &[ix], owner, &[]).await?;

        Ok(WithdrawResult {
            signature:        sig.to_string(),
            vault:            vault_addr,
            units:            position.units,
            estimated_amount: position.redeemable_lp,
        })
    }

    pub async fn transfer_units(
        &self,
        sender:    &Keypair,
        lp_mint:   Pubkey,
        recipient: Pubkey,
        units:     u64,
    ) -> Result<TxResult> {
        if recipient == sender.pubkey() {
            return Err(Error::InvalidArgument("cannot transfer units to yourself".into()));
        }
        let rpc = self.rpc();
        let (vault_addr, _) = self.fetch_vault(&rpc, &lp_mint).await?;
        let ix = transfer_units_ix(&self.program_id, &sender.pubkey(), &recipient, &vault_addr, units);
        let sig = self.sign_and_send(&rpc, &[ix], sender, &[]).await?;
        Ok(TxResult { signature: sig.to_string(), vault: vault_addr })
    }

    // ── Compounding / keeper ──────────────────────────────────────────────────

    pub async fn compound(&self, payer: &Keypair, lp_mint: Pubkey) -> Result<TxResult> {
        let rpc = self.rpc();
        let (vault_addr, vault) = self.fetch_vault(&rpc, &lp_mint).await?;
        let liquefy = self.liquefy_accounts(&rpc, &vault).await?;
        let ix = compound_ix(&self.program_id, &vault_addr, &liquefy);
        let sig = self.sign_and_send(&rpc, &[ix], payer, &[]).await?;
        Ok(TxResult { signature: sig.to_string(), vault: vault_addr })
    }

    /// Dispatch a `check_work` result. `perform_data` is the 32-byte LP mint.
    pub async fn perform_work(&self, payer: &Keypair, perform_data: &[u8]) -> Result<TxResult> {
        let bytes: [u8; 32] = perform_data.try_into().map_err(|_| {
            Error::InvalidArgument(format!("perform_data is {} bytes; expected 32", perform_data.len()))
        })?;
        let lp_mint = Pubkey::from(bytes);

        let rpc = self.rpc();
        let (vault_addr, vault) = self.fetch_vault(&rpc, &lp_mint).await?;
        let liquefy = self.liquefy_accounts(&rpc, &vault).await?;
        let ix = perform_work_ix(&self.program_id, &vault_addr, &liquefy, perform_data);
        let sig = self.sign_and_send(&rpc, &[ix], payer, &[]).await?;
        Ok(TxResult { signature: sig.to_string(), vault: vault_addr })
    }

    /// First vault in `[start, end)` needing work, answered by the program's
    /// own `check_work` in simulation. The range is walked in batches and the
    /// walk stops at the first batch with a match. `payer` only funds the
    /// simulated fee and is never charged.
    pub async fn check_work(
        &self,
        payer:       &Pubkey,
        start_index: u64,
        end_index:   u64,
    ) -> Result<CheckWorkOutcome> {
        let rpc = self.rpc();
        let registry = self.fetch_registry(&rpc).await?;
        let end = end_index.min(registry.vault_count);
        let (registry_addr, _) = derive_registry(&self.program_id);

        let mut lo = start_index;
        while lo < end {
            let hi = lo.saturating_add(CHECK_WORK_BATCH).min(end);
            let index_keys: Vec<Pubkey> = (lo..hi)
                .map(|i| derive_vault_index(&registry_addr, i, &self.program_id).0)
                .collect();
            let mut entries = Vec::with_capacity(index_keys.len());
            for (i, data) in (lo..hi).zip(self.fetch_many(&rpc, &index_keys).await?) {
                let data = data.ok_or(Error::VaultIndexNotFound(i))?;
                entries.push(parse_vault_index(&data)?);
            }

            let accounts: Vec<(Pubkey, Pubkey, Pubkey)> = entries
                .iter()
                .map(|e| {
                    let (_, a, b) = derive_vault_token_accounts(&e.vault, &self.program_id);
                    (e.vault, a, b)
                })
                .collect();
            let ix = check_work_ix(&self.program_id, lo, hi, &accounts);
            let result = parse_check_work_return(&self.simulate_return(&rpc, payer, ix).await?)?;

            if result.upkeep_needed {
                let lp_mint = <[u8; 32]>::try_from(result.perform_data.as_slice())
                    .ok()
                    .map(Pubkey::from);
                let index = lp_mint
                    .and_then(|m| entries.iter().find(|e| e.lp_mint == m))
                    .map(|e| e.index);
                return Ok(CheckWorkOutcome {
                    upkeep_needed: true,
                    perform_data:  result.perform_data,
                    lp_mint,
                    index,
                });
            }
            lo = hi;
        }
        Ok(CheckWorkOutcome::default())
    }

    /// The program's `needs_compounding` for one vault, via simulation.
    pub async fn needs_compounding(&self, payer: &Pubkey, lp_mint: Pubkey) -> Result<bool> {
        let rpc = self.rpc();
        let (vault_addr, vault) = self.fetch_vault(&rpc, &lp_mint).await?;
        let ix = needs_compounding_ix(&self.program_id, &vault, &vault_addr);
        parse_bool_return(&self.simulate_return(&rpc, payer, ix).await?)
    }

    /// Every vault in `[start, end)` needing work, in index order, evaluated
    /// off-chain against the cluster clock.
    pub async fn pending_work(&self, start_index: u64, end_index: u64) -> Result<Vec<VaultInfo>> {
        Ok(self
            .vault_infos(start_index, end_index)
            .await?
            .into_iter()
            .filter(|v| v.needs_compounding)
            .collect())
    }

    // ── Read operations ───────────────────────────────────────────────────────

    pub async fn registry_info(&self) -> Result<RegistryInfo> {
        let rpc = self.rpc();
        let state = self.fetch_registry(&rpc).await?;
        Ok(RegistryInfo {
            address:     derive_registry(&self.program_id).0,
            governor:    state.governor,
            vault_count: state.vault_count,
        })
    }

    pub async fn vault_info(&self, lp_mint: Pubkey) -> Result<VaultInfo> {
        let rpc = self.rpc();
        let (addr, vault) = self.fetch_vault(&rpc, &lp_mint).await?;
        let now = self.now_inner(&rpc).await?;
        let mut infos = self.with_balances(&rpc, vec![(addr, vault)], now).await?;
        infos.pop().ok_or(Error::VaultNotFound(lp_mint))
    }

    pub async fn vault_info_by_index(&self, index: u64) -> Result<VaultInfo> {
        let mut infos = self.vault_infos(index, index.saturating_add(1)).await?;
        infos.pop().ok_or(Error::VaultIndexNotFound(index))
    }

    /// Vaults registered at `[start, min(end, vault_count))`, with balances.
    pub async fn vault_infos(&self, start_index: u64, end_index: u64) -> Result<Vec<VaultInfo>> {
        let rpc = self.rpc();
        let vaults = self.vaults_in_range(&rpc, start_index, end_index).await?;
        let now = self.now_inner(&rpc).await?;
        self.with_balances(&rpc, vaults, now).await
    }

    pub async fn position(&self, lp_mint: Pubkey, owner: Pubkey) -> Result<PositionInfo> {
        let rpc = self.rpc();
        let (vault_addr, vault) = self.fetch_vault(&rpc, &lp_mint).await?;
        self.position_inner(&rpc, &vault_addr, &vault, &owner).await
    }

    /// All non-empty positions held by `owner`, via `getProgramAccounts`.
    pub async fn my_positions(&self, owner: &Pubkey) -> Result<Vec<PositionInfo>> {
        let rpc = self.rpc();
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![
                RpcFilterType::DataSize(SHARE_BALANCE_LEN as u64),
                RpcFilterType::Memcmp(Memcmp::new(
                    0,
                    MemcmpEncodedBytes::Bytes(account_disc("ShareBalance").to_vec()),
                )),
                RpcFilterType::Memcmp(Memcmp::new(
                    SHARE_BALANCE_OWNER_OFFSET,
                    MemcmpEncodedBytes::Bytes(owner.to_bytes().to_vec()),
                )),
            ]),
            account_config: RpcAccountInfoConfig { ..Default::default() },
            ..Default::default()
        };
        let raw = rpc.get_program_accounts_with_config(&self.program_id, config).await?;
        let balances: Vec<(Pubkey, _)> = raw
            .into_iter()
            .filter_map(|(pk, acc)| parse_share_balance(&acc.data).ok().map(|s| (pk, s)))
            .filter(|(_, s)| s.units > 0)
            .collect();

        let vault_keys: Vec<Pubkey> = balances.iter().map(|(_, s)| s.vault).collect();
        let vault_data = self.fetch_many(&rpc, &vault_keys).await?;
        let held: Vec<_> = balances
            .into_iter()
            .zip(vault_data)
            .filter_map(|((pk, share), data)| {
                data.and_then(|d| parse_vault(&d).ok()).map(|v| (pk, share, v))
            })
            .collect();

        let lp_keys: Vec<Pubkey> = held.iter().map(|(_, _, v)| v.lp_account).collect();
        let lp_balances = self.fetch_many(&rpc, &lp_keys).await?;
        let now = self.now_inner(&rpc).await?;

        let mut out = Vec::with_capacity(held.len());
        for ((address, share, vault), lp_data) in held.into_iter().zip(lp_balances) {
            let lp_balance = lp_data.as_deref().map(parse_token_amount).transpose()?.unwrap_or(0);
            out.push(PositionInfo {
                address,
                vault:         share.vault,
                lp_mint:       vault.lp_mint,
                owner:         share.owner,
                units:         share.units,
                redeemable_lp: assets_for_units(share.units, lp_balance, vault.total_supply)?,
                locked:        is_locked(&vault, &share.owner, now),
            });
        }
        Ok(out)
    }

    /// Cluster time from the Clock sysvar.
    pub async fn now(&self) -> Result<i64> {
        self.now_inner(&self.rpc()).await
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn rpc(&self) -> RpcClient {
        RpcClient::new_with_commitment(self.rpc_url.clone(), CommitmentConfig::confirmed())
    }

    async fn sign_and_send(
        &self,
        rpc:          &RpcClient,
        instructions: &[Instruction],
        payer:        &Keypair,
        extra:        &[&Keypair],
    ) -> Result<Signature> {
        let blockhash = rpc.get_latest_blockhash().await?;
        let mut signers: Vec<&dyn Signer> = vec![payer];
        signers.extend(extra.iter().map(|k| *k as &dyn Signer));
        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&payer.pubkey()),
            &signers,
            blockhash,
        );
        Ok(rpc.send_and_confirm_transaction(&tx).await?)
    }

    /// Simulate a single read-only instruction and return its decoded return
    /// data. No return data reads as empty.
    async fn simulate_return(&self, rpc: &RpcClient, payer: &Pubkey, ix: Instruction) -> Result<Vec<u8>> {
        let tx = Transaction::new_unsigned(Message::new(&[ix], Some(payer)));
        let config = RpcSimulateTransactionConfig {
            sig_verify:               false,
            replace_recent_blockhash: true,
            commitment:               Some(CommitmentConfig::confirmed()),
            ..RpcSimulateTransactionConfig::default()
        };
        let sim = rpc.simulate_transaction_with_config(&tx, config).await?.value;
        if let Some(err) = sim.err {
            let logs = sim.logs.unwrap_or_default().join("\n");
            return Err(Error::Simulation(format!("{err}\n{logs}")));
        }
        let Some(ret) = sim.return_data else {
            return Ok(vec![]);
        };
        if ret.program_id != self.program_id.to_string() {
            return Err(Error::Simulation(format!(
                "return data came from {}, not {}",
                ret.program_id, self.program_id
            )));
        }
        STANDARD.decode(&ret.data.0).map_err(|e| Error::ParseError {
            offset: 0,
            reason: format!("return data is not base64: {e}"),
        })
    }

    async fn now_inner(&self, rpc: &RpcClient) -> Result<i64> {
        parse_clock_timestamp(&rpc.get_account_data(&sysvar::clock::ID).await?)
    }

    async fn fetch_registry(&self, rpc: &RpcClient) -> Result<RegistryState> {
        let (registry, _) = derive_registry(&self.program_id);
        let data = rpc
            .get_account_data(&registry)
            .await
            .map_err(|_| Error::RegistryNotFound(registry))?;
        parse_registry(&data)
    }

    async fn fetch_vault(&self, rpc: &RpcClient, lp_mint: &Pubkey) -> Result<(Pubkey, VaultState)> {
        let (vault, _) = derive_vault(lp_mint, &self.program_id);
        let data = rpc
            .get_account_data(&vault)
            .await
            .map_err(|_| Error::VaultNotFound(*lp_mint))?;
        Ok((vault, parse_vault(&data)?))
    }

    /// Account data for each key, `None` for missing accounts, in key order.
    async fn fetch_many(&self, rpc: &RpcClient, keys: &[Pubkey]) -> Result<Vec<Option<Vec<u8>>>> {
        let mut out = Vec::with_capacity(keys.len());
        for chunk in keys.chunks(MULTIPLE_ACCOUNTS_CHUNK) {
            let accounts = rpc.get_multiple_accounts(chunk).await?;
            out.extend(accounts.into_iter().map(|a| a.map(|a| a.data)));
        }
        Ok(out)
    }

    /// Vaults at `[start, min(end, vault_count))` via the registry's index entries.
    async fn vaults_in_range(
        &self,
        rpc:   &RpcClient,
        start: u64,
        end:   u64,
    ) -> Result<Vec<(Pubkey, VaultState)>> {
        let registry = self.fetch_registry(rpc).await?;
        let end = end.min(registry.vault_count);
        if start >= end {
            return Ok(vec![]);
        }
        let (registry_addr, _) = derive_registry(&self.program_id);
        let index_keys: Vec<Pubkey> = (start..end)
            .map(|i| derive_vault_index(&registry_addr, i, &self.program_id).0)
            .collect();

        let mut vault_keys = Vec::with_capacity(index_keys.len());
        for (i, data) in (start..end).zip(self.fetch_many(rpc, &index_keys).await?) {
            let data = data.ok_or(Error::VaultIndexNotFound(i))?;
            vault_keys.push(parse_vault_index(&data)?.vault);
        }

        let mut out = Vec::with_capacity(vault_keys.len());
        for (key, data) in vault_keys.iter().zip(self.fetch_many(rpc, &vault_keys).await?) {
            let data = data.ok_or_else(|| Error::InvalidArgument(format!("vault {key} is missing")))?;
            out.push((*key, parse_vault(&data)?));
        }
        Ok(out)
    }

    /// Every vault in index order when `lp_mints` is empty, else the listed ones.
    async fn target_vaults(&self, rpc: &RpcClient, lp_mints: &[Pubkey]) -> Result<Vec<Pubkey>> {
        if lp_mints.is_empty() {
            let vaults = self.vaults_in_range(rpc, 0, u64::MAX).await?;
            return Ok(vaults.into_iter().map(|(k, _)| k).collect());
        }
        Ok(lp_mints.iter().map(|m| derive_vault(m, &self.program_id).0).collect())
    }

    async fn with_balances(
        &self,
        rpc:    &RpcClient,
        vaults: Vec<(Pubkey, VaultState)>,
        now:    i64,
    ) -> Result<Vec<VaultInfo>> {
        let token_keys: Vec<Pubkey> = vaults
            .iter()
            .flat_map(|(_, v)| [v.lp_account, v.reward_a_account, v.reward_b_account])
            .collect();
        let balances = self.fetch_many(rpc, &token_keys).await?;
        let amount = |i: usize| -> Result<u64> {
            balances[i].as_deref().map(parse_token_amount).transpose().map(|a| a.unwrap_or(0))
        };

        let mut out = Vec::with_capacity(vaults.len());
        for (n, (address, v)) in vaults.into_iter().enumerate() {
            let lp_balance = amount(3 * n)?;
            let reward_a_balance = amount(3 * n + 1)?;
            let reward_b_balance = amount(3 * n + 2)?;
            out.push(VaultInfo {
                address,
                index:               v.index,
                symbol:              v.symbol.clone(),
                lp_mint:             v.lp_mint,
                reward_a_mint:       v.reward_a_mint,
                reward_b_mint:       v.reward_b_mint,
                router_pool:         v.router_pool,
                initializer:         v.initializer,
                initialized:         v.initialized,
                unlock_at:           unlock_at(&v),
                total_supply:        v.total_supply,
                lp_balance,
                reward_a_balance,
                reward_b_balance,
                redemption_rate:     redemption_rate(lp_balance, v.total_supply),
                fee_recipient:       v.fee_recipient,
                fee_enabled:         v.fee_enabled,
                fee_rate_bps:        v.fee_rate_bps,
                automation_interval: v.automation_interval,
                last_compounded_at:  v.last_compounded_at,
                needs_compounding:   needs_compounding(&v, reward_a_balance, reward_b_balance, now),
            });
        }
        Ok(out)
    }

    async fn liquefy_accounts(&self, rpc: &RpcClient, vault: &VaultState) -> Result<LiquefyAccounts> {
        let pool = parse_router_pool(&rpc.get_account_data(&vault.router_pool).await?)?;
        Ok(LiquefyAccounts::resolve(vault, &pool))
    }

    /// Units a deposit would mint at the current, pre-compound rate.
    async fn estimate_units(&self, rpc: &RpcClient, vault: &VaultState, amount: u64) -> Result<u64> {
        let lp_balance = parse_token_amount(&rpc.get_account_data(&vault.lp_account).await?)?;
        units_for_deposit(amount, vault.total_supply, lp_balance)
    }

    async fn position_inner(
        &self,
        rpc:        &RpcClient,
        vault_addr: &Pubkey,
        vault:      &VaultState,
        owner:      &Pubkey,
    ) -> Result<PositionInfo> {
        let (address, _) = derive_share_balance(vault_addr, owner, &self.program_id);
        let data = rpc
            .get_account_data(&address)
            .await
            .map_err(|_| Error::PositionNotFound { vault: *vault_addr, owner: *owner })?;
        let share = parse_share_balance(&data)?;
        let lp_balance = parse_token_amount(&rpc.get_account_data(&vault.lp_account).await?)?;
        let now = self.now_inner(rpc).await?;

        Ok(PositionInfo {
            address,
            vault:         *vault_addr,
            lp_mint:       vault.lp_mint,
            owner:         *owner,
            units:         share.units,
            redeemable_lp: assets_for_units(share.units, lp_balance, vault.total_supply)?,
            locked:        is_locked(vault, owner, now),
        })
    }
}

// ─── Utilities ────────────────────────────────────────────────────────────────

/// Anchor account discriminator: `sha256("account:{TypeName}")[..8]`.
fn account_disc(type_name: &str) -> [u8; 8] {
    let h = hash(format!("account:{type_name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&h.to_bytes()[..8]);
    out
}
