/// PDA seeds
pub const REGISTRY_SEED: &[u8] = b"registry";
pub const VAULT_INDEX_SEED: &[u8] = b"vault_index";
pub const VAULT_SEED: &[u8] = b"vault";
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";
pub const SHARE_SEED: &[u8] = b"share";
pub const VAULT_LP_SEED: &[u8] = b"vault_lp";
pub const REWARD_A_SEED: &[u8] = b"reward_a";
pub const REWARD_B_SEED: &[u8] = b"reward_b";

/// Initializer units stay transfer-locked for 7 days after bootstrap
pub const LOCK_PERIOD: i64 = 7 * 24 * 60 * 60;

/// Smallest LP backing the registry may bootstrap a vault with
pub const MIN_INITIALIZATION_AMOUNT: u64 = 1_000;

/// Compounding fee cap: 10 %
pub const MAX_FEE_BPS: u16 = 1_000;

/// Denominator for basis-point math (u128 to avoid up-cast noise)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Floor passed as both router minimums; rejects a router call that adds nothing
pub const ROUTER_MIN_AMOUNT: u64 = 1;

pub const MAX_SYMBOL_LEN: usize = 16;

/// check_work reads (vault, reward_a_account, reward_b_account) per index
pub const ACCOUNTS_PER_PROBE: usize = 3;
