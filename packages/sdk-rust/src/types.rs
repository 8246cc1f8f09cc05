//! Result types returned by [`crate::VaultClient`].
//!
//! Pubkeys serialize as base58 strings so results can be printed with
//! `serde_json` directly.

use serde::{Serialize, Serializer};
use solana_sdk::pubkey::Pubkey;

fn b58<S: Serializer>(key: &Pubkey, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&key.to_string())
}

fn b58_opt<S: Serializer>(key: &Option<Pubkey>, s: S) -> Result<S::Ok, S::Error> {
    match key {
        Some(k) => s.serialize_some(&k.to_string()),
        None => s.serialize_none(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryInfo {
    #[serde(serialize_with = "b58")]
    pub address:     Pubkey,
    #[serde(serialize_with = "b58")]
    pub governor:    Pubkey,
    pub vault_count: u64,
}

/// Vault state plus live token balances.
#[derive(Debug, Clone, Serialize)]
pub struct VaultInfo {
    #[serde(serialize_with = "b58")]
    pub address:             Pubkey,
    pub index:               u64,
    pub symbol:              String,
    #[serde(serialize_with = "b58")]
    pub lp_mint:             Pubkey,
    #[serde(serialize_with = "b58")]
    pub reward_a_mint:       Pubkey,
    #[serde(serialize_with = "b58")]
    pub reward_b_mint:       Pubkey,
    #[serde(serialize_with = "b58")]
    pub router_pool:         Pubkey,
    #[serde(serialize_with = "b58")]
    pub initializer:         Pubkey,
    pub initialized:         bool,
    pub unlock_at:           i64,
    pub total_supply:        u64,
    pub lp_balance:          u64,
    pub reward_a_balance:    u64,
    pub reward_b_balance:    u64,
    /// LP redeemable per unit
    pub redemption_rate:     f64,
    #[serde(serialize_with = "b58")]
    pub fee_recipient:       Pubkey,
    pub fee_enabled:         bool,
    pub fee_rate_bps:        u16,
    pub automation_interval: i64,
    pub last_compounded_at:  i64,
    pub needs_compounding:   bool,
}

/// One holder's units in one vault.
#[derive(Debug, Clone, Serialize)]
pub struct PositionInfo {
    #[serde(serialize_with = "b58")]
    pub address:       Pubkey,
    #[serde(serialize_with = "b58")]
    pub vault:         Pubkey,
    #[serde(serialize_with = "b58")]
    pub lp_mint:       Pubkey,
    #[serde(serialize_with = "b58")]
    pub owner:         Pubkey,
    pub units:         u64,
    /// LP paid if all units were withdrawn now (before compounding)
    pub redeemable_lp: u64,
    pub locked:        bool,
}

/// The program's `check_work` answer, as returned by simulation.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct CheckWorkOutcome {
    pub upkeep_needed: bool,
    pub perform_data:  Vec<u8>,
    #[serde(serialize_with = "b58_opt")]
    pub lp_mint:       Option<Pubkey>,
    /// Registry index of the matched vault
    pub index:         Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeployResult {
    pub signature: String,
    #[serde(serialize_with = "b58")]
    pub vault:     Pubkey,
    #[serde(serialize_with = "b58")]
    pub lp_mint:   Pubkey,
    pub index:     u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StakeResult {
    pub signature:       String,
    #[serde(serialize_with = "b58")]
    pub vault:           Pubkey,
    pub amount:          u64,
    /// Estimated at submission; the program prices after compounding
    pub estimated_units: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawResult {
    pub signature:        String,
    #[serde(serialize_with = "b58")]
    pub vault:            Pubkey,
    pub units:            u64,
    pub estimated_amount: u64,
}

/// Signature-only result for operations with nothing else to report.
#[derive(Debug, Clone, Serialize)]
pub struct TxResult {
    pub signature: String,
    #[serde(serialize_with = "b58")]
    pub vault:     Pubkey,
}
