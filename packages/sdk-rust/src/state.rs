//! On-chain account deserialization.
//!
//! Parses raw account bytes for `Registry` (49 bytes), `VaultIndex`
//! (113 bytes), `Vault` (426 bytes) and `ShareBalance` (81 bytes), plus the
//! router pool and SPL token accounts the vault reads. Byte offsets mirror
//! the Anchor `#[account]` layout exactly.

use solana_sdk::pubkey::Pubkey;
use crate::error::{Error, Result};

pub const REGISTRY_LEN:      usize = 49;
pub const VAULT_INDEX_LEN:   usize = 113;
pub const VAULT_LEN:         usize = 426;
pub const SHARE_BALANCE_LEN: usize = 81;

/// Offset of the Borsh `symbol` string inside `Vault`.
const VAULT_SYMBOL_OFFSET: usize = 406;
/// Shortest valid `Vault`: the fixed fields plus an empty symbol.
pub const VAULT_MIN_LEN: usize = VAULT_SYMBOL_OFFSET + 4;

/// Offset of `ShareBalance.owner`, used as a `getProgramAccounts` memcmp filter.
pub const SHARE_BALANCE_OWNER_OFFSET: usize = 40;

// ─── Registry ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryState {
    pub governor:    Pubkey,
    pub vault_count: u64,
}

/// Layout: `governor(32) vault_count(8) bump(1)`
pub fn parse_registry(data: &[u8]) -> Result<RegistryState> {
    check_len(data, REGISTRY_LEN, "Registry")?;
    Ok(RegistryState {
        governor:    read_pubkey(data, 8)?,
        vault_count: read_u64(data, 40)?,
    })
}

// ─── VaultIndex ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultIndexState {
    pub registry: Pubkey,
    pub index:    u64,
    pub lp_mint:  Pubkey,
    pub vault:    Pubkey,
}

/// Layout: `registry(32) index(8) lp_mint(32) vault(32) bump(1)`
pub fn parse_vault_index(data: &[u8]) -> Result<VaultIndexState> {
    check_len(data, VAULT_INDEX_LEN, "VaultIndex")?;
    Ok(VaultIndexState {
        registry: read_pubkey(data, 8)?,
        index:    read_u64(data, 40)?,
        lp_mint:  read_pubkey(data, 48)?,
        vault:    read_pubkey(data, 80)?,
    })
}

// ─── Vault ────────────────────────────────────────────────────────────────────

/// Deserialized `Vault` account state.
///
/// Layout (after 8-byte Anchor discriminator):
/// ```text
/// registry(32) index(8) lp_mint(32) reward_a_mint(32) reward_b_mint(32)
/// router_program(32) router_pool(32) lp_account(32) reward_a_account(32)
/// reward_b_account(32) initializer(32) initialized_at(8) initialized(1)
/// total_supply(8) fee_recipient(32) fee_enabled(1) fee_rate_bps(2)
/// automation_interval(8) last_compounded_at(8) bump(1) authority_bump(1)
/// symbol(4 + ≤16)  = 426 bytes
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultState {
    pub registry:            Pubkey,
    pub index:               u64,
    pub lp_mint:             Pubkey,
    pub reward_a_mint:       Pubkey,
    pub reward_b_mint:       Pubkey,
    pub router_program:      Pubkey,
    pub router_pool:         Pubkey,
    pub lp_account:          Pubkey,
    pub reward_a_account:    Pubkey,
    pub reward_b_account:    Pubkey,
    pub initializer:         Pubkey,
    pub initialized_at:      i64,
    pub initialized:         bool,
    pub total_supply:        u64,
    pub fee_recipient:       Pubkey,
    pub fee_enabled:         bool,
    pub fee_rate_bps:        u16,
    pub automation_interval: i64,
    pub last_compounded_at:  i64,
    pub symbol:              String,
}

pub fn parse_vault(data: &[u8]) -> Result<VaultState> {
    check_len(data, VAULT_MIN_LEN, "Vault")?;
    Ok(VaultState {
        registry:            read_pubkey(data, 8)?,
        index:               read_u64(data, 40)?,
        lp_mint:             read_pubkey(data, 48)?,
        reward_a_mint:       read_pubkey(data, 80)?,
        reward_b_mint:       read_pubkey(data, 112)?,
        router_program:      read_pubkey(data, 144)?,
        router_pool:         read_pubkey(data, 176)?,
        lp_account:          read_pubkey(data, 208)?,
        reward_a_account:    read_pubkey(data, 240)?,
        reward_b_account:    read_pubkey(data, 272)?,
        initializer:         read_pubkey(data, 304)?,
        initialized_at:      read_i64(data, 336)?,
        initialized:         read_bool(data, 344)?,
        total_supply:        read_u64(data, 345)?,
        fee_recipient:       read_pubkey(data, 353)?,
        fee_enabled:         read_bool(data, 385)?,
        fee_rate_bps:        read_u16(data, 386)?,
        automation_interval: read_i64(data, 388)?,
        last_compounded_at:  read_i64(data, 396)?,
        symbol:              read_string(data, VAULT_SYMBOL_OFFSET)?,
    })
}

// ─── ShareBalance ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareBalanceState {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub units: u64,
}

/// Layout: `vault(32) owner(32) units(8) bump(1)`
pub fn parse_share_balance(data: &[u8]) -> Result<ShareBalanceState> {
    check_len(data, SHARE_BALANCE_LEN, "ShareBalance")?;
    Ok(ShareBalanceState {
        vault: read_pubkey(data, 8)?,
        owner: read_pubkey(data, SHARE_BALANCE_OWNER_OFFSET)?,
        units: read_u64(data, 72)?,
    })
}

// ─── Router pool ──────────────────────────────────────────────────────────────

/// The slice of the router's pool account the vault depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterPoolState {
    pub mint_a:  Pubkey,
    pub mint_b:  Pubkey,
    pub lp_mint: Pubkey,
    pub token_a: Pubkey,
    pub token_b: Pubkey,
}

/// Layout: `disc(8) mint_a(32) mint_b(32) lp_mint(32) token_a(32) token_b(32) …`
pub fn parse_router_pool(data: &[u8]) -> Result<RouterPoolState> {
    check_len(data, 168, "router pool")?;
    Ok(RouterPoolState {
        mint_a:  read_pubkey(data, 8)?,
        mint_b:  read_pubkey(data, 40)?,
        lp_mint: read_pubkey(data, 72)?,
        token_a: read_pubkey(data, 104)?,
        token_b: read_pubkey(data, 136)?,
    })
}

// ─── SPL token account ────────────────────────────────────────────────────────

/// Read the `amount` field from a packed SPL token account.
///
/// Token account layout: `mint(32) owner(32) amount(8) …`
pub fn parse_token_amount(data: &[u8]) -> Result<u64> {
    if data.len() < 72 {
        return Err(Error::ParseError {
            offset: 64,
            reason: format!("Token account is {} bytes; need at least 72", data.len()),
        });
    }
    read_u64(data, 64)
}

// ─── Clock sysvar ─────────────────────────────────────────────────────────────

/// `unix_timestamp` from the Clock sysvar:
/// `slot(8) epoch_start_timestamp(8) epoch(8) leader_schedule_epoch(8) unix_timestamp(8)`
pub fn parse_clock_timestamp(data: &[u8]) -> Result<i64> {
    read_i64(data, 32)
}

// ─── Return data ──────────────────────────────────────────────────────────────

/// Runtime cap on program return data.
const MAX_RETURN_DATA: usize = 1024;

/// Decoded `CheckWorkResult` return value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckWorkReturn {
    pub upkeep_needed: bool,
    pub perform_data:  Vec<u8>,
}

/// The runtime drops trailing zero bytes from return data, so missing
/// bytes past the end read as zero.
fn zero_extended(data: &[u8], len: usize) -> Vec<u8> {
    let mut out = data.to_vec();
    if out.len() < len {
        out.resize(len, 0);
    }
    out
}

/// Layout: `upkeep_needed(1) perform_data(4 + len)`
pub fn parse_check_work_return(data: &[u8]) -> Result<CheckWorkReturn> {
    let head = zero_extended(data, 5);
    let len = u32::from_le_bytes(slice::<4>(&head, 1, "perform_data length")?) as usize;
    if len > MAX_RETURN_DATA - 5 {
        return Err(Error::ParseError {
            offset: 1,
            reason: format!("perform_data length {len} exceeds the return data limit"),
        });
    }
    if data.len() > 5 + len {
        return Err(Error::ParseError {
            offset: 5 + len,
            reason: format!("{} trailing bytes after perform_data", data.len() - 5 - len),
        });
    }
    let full = zero_extended(data, 5 + len);
    Ok(CheckWorkReturn {
        upkeep_needed: read_bool(&full, 0)?,
        perform_data:  full[5..].to_vec(),
    })
}

/// A bare Borsh `bool` return value.
pub fn parse_bool_return(data: &[u8]) -> Result<bool> {
    read_bool(&zero_extended(data, 1), 0)
}

// ─── Byte-slice primitives ────────────────────────────────────────────────────

fn check_len(data: &[u8], expected: usize, name: &str) -> Result<()> {
    if data.len() < expected {
        return Err(Error::ParseError {
            offset: 0,
            reason: format!("{name} account is {} bytes; expected {expected}", data.len()),
        });
    }
    Ok(())
}

fn slice<const N: usize>(data: &[u8], offset: usize, what: &str) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| Error::ParseError {
            offset,
            reason: format!("slice too short for {what} ({N} bytes)"),
        })
}

pub(crate) fn read_pubkey(data: &[u8], offset: usize) -> Result<Pubkey> {
    Ok(Pubkey::from(slice::<32>(data, offset, "Pubkey")?))
}

pub(crate) fn read_bool(data: &[u8], offset: usize) -> Result<bool> {
    Ok(slice::<1>(data, offset, "bool")?[0] != 0)
}

pub(crate) fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    Ok(u16::from_le_bytes(slice::<2>(data, offset, "u16")?))
}

pub(crate) fn read_u64(data: &[u8], offset: usize) -> Result<u64> {
    Ok(u64::from_le_bytes(slice::<8>(data, offset, "u64")?))
}

pub(crate) fn read_i64(data: &[u8], offset: usize) -> Result<i64> {
    Ok(i64::from_le_bytes(slice::<8>(data, offset, "i64")?))
}

/// Borsh string: `len(u32) bytes(len)`.
pub(crate) fn read_string(data: &[u8], offset: usize) -> Result<String> {
    let len = u32::from_le_bytes(slice::<4>(data, offset, "string length")?) as usize;
    let bytes = data
        .get(offset + 4..offset + 4 + len)
        .ok_or_else(|| Error::ParseError {
            offset,
            reason: format!("string of {len} bytes runs past the account"),
        })?;
    String::from_utf8(bytes.to_vec()).map_err(|e| Error::ParseError {
        offset,
        reason: e.to_string(),
    })
}
