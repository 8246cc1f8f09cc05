use anchor_lang::prelude::*;

#[event]
pub struct RegistryInitialized {
    pub registry: Pubkey,
    pub governor: Pubkey,
}

#[event]
pub struct GovernorUpdated {
    pub registry: Pubkey,
    pub previous: Pubkey,
    pub governor: Pubkey,
}

#[event]
pub struct VaultDeployed {
    pub vault: Pubkey,
    pub lp_mint: Pubkey,
    pub index: u64,
    pub symbol: String,
}

#[event]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub initializer: Pubkey,
    pub units: u64,
    pub unlock_at: i64,
}

#[event]
pub struct Staked {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub units: u64,
}

#[event]
pub struct Withdrawn {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub units: u64,
    pub amount: u64,
}

/// Rewards paired back into LP.
#[event]
pub struct Liquefied {
    pub vault: Pubkey,
    pub amount_a: u64,
    pub amount_b: u64,
    pub liquidity: u64,
    pub fee: u64,
    pub net: u64,
}

#[event]
pub struct VaultParamsUpdated {
    pub vault: Pubkey,
    pub fee_recipient: Pubkey,
    pub fee_enabled: bool,
    pub fee_rate_bps: u16,
    pub automation_interval: i64,
}

#[event]
pub struct UnitsTransferred {
    pub vault: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    pub units: u64,
}
