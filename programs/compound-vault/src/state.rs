use anchor_lang::prelude::*;
use crate::{
    constants::*,
    error::VaultError,
    instructions::vault_math::{self, LiquidityCut},
};

// ─── Registry ──────────────────────────────────────────────────────────────
// Deploys vaults and keeps the append-only index the keepers scan.
#[account]
#[derive(Default)]
pub struct Registry {
    /// Only key allowed to deploy vaults and change their parameters
    pub governor: Pubkey,           // 32
    /// Number of registered vaults; also the next free index
    pub vault_count: u64,           // 8
    pub bump: u8,                   // 1
}

impl Registry {
    // 8 discriminator + 32+8+1 = 49
    pub const LEN: usize = 49;

    /// Reserve the next index. Indices are never reused or rewritten.
    pub fn register(&mut self) -> Result<u64> {
        let index = self.vault_count;
        self.vault_count = index.checked_add(1).ok_or(VaultError::MathOverflow)?;
        Ok(index)
    }

    /// Upper bound of a scan, clamped to the registered count.
    pub fn clamp_end(&self, end_index: u64) -> u64 {
        end_index.min(self.vault_count)
    }
}

// ─── VaultIndex ────────────────────────────────────────────────────────────
// One entry of the registry's LP-mint list, addressed by position.
#[account]
#[derive(Default)]
pub struct VaultIndex {
    pub registry: Pubkey,           // 32
    pub index: u64,                 // 8
    pub lp_mint: Pubkey,            // 32
    pub vault: Pubkey,              // 32
    pub bump: u8,                   // 1
}

impl VaultIndex {
    // 8 + 32+8+32+32+1 = 113
    pub const LEN: usize = 113;
}

// ─── VaultParams ───────────────────────────────────────────────────────────
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VaultParams {
    /// Owner of the LP token account that receives compounding fees
    pub fee_recipient: Pubkey,      // 32
    pub fee_enabled: bool,          // 1
    /// Share of newly minted LP taken as fee, in basis points
    pub fee_rate_bps: u16,          // 2
    /// Minimum seconds between keeper-driven compounds
    pub automation_interval: i64,   // 8
}

impl VaultParams {
    pub fn validate(&self) -> Result<()> {
        require!(self.fee_rate_bps <= MAX_FEE_BPS, VaultError::ExcessiveFeeValue);
        require!(self.automation_interval >= 0, VaultError::InvalidAutomationInterval);
        Ok(())
    }
}

// ─── Vault ─────────────────────────────────────────────────────────────────
// Custodies one LP mint. The ownership ledger is total_supply here plus one
// ShareBalance per holder; LP backing sits in lp_account.
#[account]
#[derive(Default)]
pub struct Vault {
    /// Registry that deployed this vault; the only key allowed to mutate params
    pub registry: Pubkey,           // 32
    /// Position in the registry's LP-mint list
    pub index: u64,                 // 8
    pub lp_mint: Pubkey,            // 32
    pub reward_a_mint: Pubkey,      // 32
    pub reward_b_mint: Pubkey,      // 32
    pub router_program: Pubkey,     // 32
    pub router_pool: Pubkey,        // 32
    /// Token accounts owned by the vault authority PDA
    pub lp_account: Pubkey,         // 32
    pub reward_a_account: Pubkey,   // 32
    pub reward_b_account: Pubkey,   // 32
    /// Bootstrap depositor, transfer-locked until initialized_at + LOCK_PERIOD
    pub initializer: Pubkey,        // 32
    pub initialized_at: i64,        // 8
    pub initialized: bool,          // 1
    /// Ownership units outstanding
    pub total_supply: u64,          // 8
    pub params: VaultParams,        // 43
    pub last_compounded_at: i64,    // 8
    pub bump: u8,                   // 1
    pub authority_bump: u8,         // 1
    pub symbol: String,             // 4 + 16
}

impl Vault {
    // 8 + 32+8+32*9+8+1+8+43+8+1+1+(4+16) = 426
    pub const LEN: usize = 426;

    /// Parameter writes are reserved to the owning registry.
    pub fn apply_params(&mut self, caller: &Pubkey, params: &VaultParams) -> Result<()> {
        require_keys_eq!(*caller, self.registry, VaultError::Unauthorized);
        params.validate()?;
        self.params = *params;
        Ok(())
    }

    /// One-time bootstrap mint to the initializer.
    ///
    /// `pool_balance` is the LP already sitting in the vault; the mint is
    /// refused unless it is fully backed.
    pub fn initialize(
        &mut self,
        caller: &Pubkey,
        holder: &mut ShareBalance,
        amount: u64,
        pool_balance: u64,
        now: i64,
    ) -> Result<()> {
        require_keys_eq!(*caller, self.registry, VaultError::Unauthorized);
        require!(!self.initialized, VaultError::AlreadyInitialized);
        require!(
            pool_balance >= amount && amount >= MIN_INITIALIZATION_AMOUNT,
            VaultError::InsufficientInitializationAmount
        );
        require_keys_eq!(holder.owner, self.initializer, VaultError::Unauthorized);

        self.initialized = true;
        self.initialized_at = now;
        self.mint_units(holder, amount)
    }

    pub fn unlock_at(&self) -> i64 {
        self.initialized_at.saturating_add(LOCK_PERIOD)
    }

    /// Guard run before units leave `source`.
    pub fn ensure_unlocked(&self, source: &Pubkey, now: i64) -> Result<()> {
        if self.initialized && *source == self.initializer && now < self.unlock_at() {
            return err!(VaultError::InitializerLocked);
        }
        Ok(())
    }

    pub fn mint_units(&mut self, holder: &mut ShareBalance, units: u64) -> Result<()> {
        self.total_supply = self
            .total_supply
            .checked_add(units)
            .ok_or(VaultError::MathOverflow)?;
        holder.units = holder.units.checked_add(units).ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    pub fn burn_units(&mut self, holder: &mut ShareBalance, units: u64, now: i64) -> Result<()> {
        self.ensure_unlocked(&holder.owner, now)?;
        require!(holder.units >= units, VaultError::InsufficientUnits);
        holder.units -= units;
        // supply ≥ any single balance
        self.total_supply = self
            .total_supply
            .checked_sub(units)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    pub fn transfer_units(
        &self,
        from: &mut ShareBalance,
        to: &mut ShareBalance,
        units: u64,
        now: i64,
    ) -> Result<()> {
        require_keys_neq!(from.owner, to.owner, VaultError::SelfTransfer);
        self.ensure_unlocked(&from.owner, now)?;
        require!(from.units >= units, VaultError::InsufficientUnits);
        from.units -= units;
        to.units = to.units.checked_add(units).ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    /// Mint units for a deposit priced against `pool_balance`, the LP held
    /// after compounding but before the deposit is pulled in.
    pub fn stake(&mut self, holder: &mut ShareBalance, amount: u64, pool_balance: u64) -> Result<u64> {
        require!(amount > 0, VaultError::ZeroStakeAmount);
        require!(self.initialized, VaultError::VaultNotInitialized);
        let units = vault_math::units_for_deposit(amount, self.total_supply, pool_balance)?;
        require!(units > 0, VaultError::ZeroUnitsMinted);
        self.mint_units(holder, units)?;
        Ok(units)
    }

    /// Burn `units` and return the LP owed for them.
    pub fn withdraw(
        &mut self,
        holder: &mut ShareBalance,
        units: u64,
        pool_balance: u64,
        now: i64,
    ) -> Result<u64> {
        require!(units > 0, VaultError::ZeroUnitsBurned);
        let supply_before = self.total_supply;
        self.burn_units(holder, units, now)?;
        vault_math::assets_for_units(units, pool_balance, supply_before)
    }

    /// Both reward legs are funded and the automation interval has passed.
    pub fn needs_compounding(&self, reward_a: u64, reward_b: u64, now: i64) -> bool {
        reward_a > 0
            && reward_b > 0
            && vault_math::interval_elapsed(now, self.last_compounded_at, self.params.automation_interval)
    }

    /// Decide whether a compound runs and stamp it before any CPI.
    /// Returns false (and touches nothing) when either reward leg is empty.
    pub fn begin_compound(&mut self, reward_a: u64, reward_b: u64, now: i64) -> bool {
        if reward_a == 0 || reward_b == 0 {
            return false;
        }
        self.last_compounded_at = now;
        true
    }

    pub fn split_liquidity(&self, liquidity: u64) -> Result<LiquidityCut> {
        vault_math::split_fee(liquidity, self.params.fee_enabled, self.params.fee_rate_bps)
    }

    /// Deserialize a vault passed through remaining accounts.
    pub fn load(info: &AccountInfo) -> Result<Self> {
        require_keys_eq!(*info.owner, crate::ID, VaultError::InvalidVault);
        let data = info.try_borrow_data()?;
        Vault::try_deserialize(&mut &data[..])
    }

    /// Write a vault loaded with `load` back into its account.
    pub fn store(&self, info: &AccountInfo) -> Result<()> {
        require!(info.is_writable, VaultError::InvalidVault);
        let mut data = info.try_borrow_mut_data()?;
        let mut new_data: Vec<u8> = Vec::with_capacity(Self::LEN);
        self.try_serialize(&mut new_data)?;
        require!(new_data.len() <= data.len(), VaultError::InvalidVault);
        data[..new_data.len()].copy_from_slice(&new_data);
        Ok(())
    }
}

// ─── ShareBalance ──────────────────────────────────────────────────────────
// One holder's units in one vault.
#[account]
#[derive(Default)]
pub struct ShareBalance {
    pub vault: Pubkey,              // 32
    pub owner: Pubkey,              // 32
    pub units: u64,                 // 8
    pub bump: u8,                   // 1
}

impl ShareBalance {
    // 8 + 32+32+8+1 = 81
    pub const LEN: usize = 81;

    /// Fill a freshly created balance; no-op for an existing one.
    pub fn open(&mut self, vault: Pubkey, owner: Pubkey, bump: u8) {
        if self.owner == Pubkey::default() {
            self.vault = vault;
            self.owner = owner;
            self.units = 0;
            self.bump = bump;
        }
    }
}
