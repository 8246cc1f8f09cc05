//! In-memory stand-in for the token program and router around the vault
//! engine. Each operation mirrors its instruction handler and is atomic:
//! on error every balance is restored, as the runtime would.

#![allow(dead_code)]

use std::collections::BTreeMap;

use anchor_lang::error::{Error, ERROR_CODE_OFFSET};
use anchor_lang::prelude::*;
use compound_vault::{
    error::VaultError,
    instructions::vault_math::LiquidityCut,
    state::{ShareBalance, Vault, VaultParams},
    LOCK_PERIOD,
};

pub const T0: i64 = 1_700_000_000;

#[derive(Clone)]
pub struct Sim {
    pub registry: Pubkey,
    pub vault: Vault,
    pub holders: BTreeMap<Pubkey, ShareBalance>,
    /// LP held by each wallet outside the vault
    pub wallets: BTreeMap<Pubkey, u64>,
    /// Vault token account balances
    pub lp: u64,
    pub reward_a: u64,
    pub reward_b: u64,
    pub fee_wallet: u64,
    pub now: i64,
}

impl Sim {
    pub fn new(initializer: Pubkey, params: VaultParams) -> Self {
        let registry = Pubkey::new_unique();
        let vault = Vault {
            registry,
            lp_mint: Pubkey::new_unique(),
            initializer,
            params,
            ..Default::default()
        };
        Self {
            registry,
            vault,
            holders: BTreeMap::new(),
            wallets: BTreeMap::new(),
            lp: 0,
            reward_a: 0,
            reward_b: 0,
            fee_wallet: 0,
            now: T0,
        }
    }

    pub fn no_fee() -> VaultParams {
        VaultParams { fee_recipient: Pubkey::new_unique(), ..Default::default() }
    }

    pub fn fee(bps: u16) -> VaultParams {
        VaultParams {
            fee_recipient: Pubkey::new_unique(),
            fee_enabled: true,
            fee_rate_bps: bps,
            automation_interval: 0,
        }
    }

    fn atomically<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = self.clone();
        let out = f(self);
        if out.is_err() {
            *self = snapshot;
        }
        out
    }

    pub fn fund(&mut self, who: Pubkey, lp: u64) {
        *self.wallets.entry(who).or_default() += lp;
    }

    pub fn accrue(&mut self, a: u64, b: u64) {
        self.reward_a += a;
        self.reward_b += b;
    }

    pub fn advance(&mut self, secs: i64) {
        self.now += secs;
    }

    pub fn units(&self, who: &Pubkey) -> u64 {
        self.holders.get(who).map(|h| h.units).unwrap_or(0)
    }

    pub fn wallet(&self, who: &Pubkey) -> u64 {
        self.wallets.get(who).copied().unwrap_or(0)
    }

    fn holder(&mut self, who: Pubkey) -> ShareBalance {
        let mut h = self.holders.get(&who).cloned().unwrap_or_default();
        h.open(Pubkey::default(), who, 255);
        h
    }

    fn debit(&mut self, who: &Pubkey, amount: u64) -> Result<()> {
        let bal = self.wallets.entry(*who).or_default();
        // token program rejects overdrafts
        *bal = bal.checked_sub(amount).ok_or(ProgramError::InsufficientFunds)?;
        Ok(())
    }

    /// Deploy-time bootstrap: pull `amount` from the initializer, then mint.
    pub fn deploy(&mut self, amount: u64) -> Result<()> {
        let registry = self.registry;
        let initializer = self.vault.initializer;
        self.atomically(|s| {
            s.debit(&initializer, amount)?;
            s.lp += amount;
            let mut h = s.holder(initializer);
            let lp = s.lp;
            let now = s.now;
            s.vault.initialize(&registry, &mut h, amount, lp, now)?;
            s.holders.insert(initializer, h);
            Ok(())
        })
    }

    /// Mock router: a 1:1 pool that consumes min(a, b) of each leg.
    pub fn compound(&mut self) -> Result<Option<LiquidityCut>> {
        self.atomically(|s| s.compound_inner())
    }

    fn compound_inner(&mut self) -> Result<Option<LiquidityCut>> {
        if !self.vault.begin_compound(self.reward_a, self.reward_b, self.now) {
            return Ok(None);
        }
        let liquidity = self.reward_a.min(self.reward_b);
        self.reward_a -= liquidity;
        self.reward_b -= liquidity;
        self.lp += liquidity;
        let cut = self.vault.split_liquidity(liquidity)?;
        self.lp -= cut.fee;
        self.fee_wallet += cut.fee;
        Ok(Some(cut))
    }

    pub fn stake(&mut self, who: Pubkey, amount: u64) -> Result<u64> {
        self.atomically(|s| {
            require!(amount > 0, VaultError::ZeroStakeAmount);
            require!(s.vault.initialized, VaultError::VaultNotInitialized);
            s.compound_inner()?;
            let mut h = s.holder(who);
            let lp = s.lp;
            let units = s.vault.stake(&mut h, amount, lp)?;
            s.debit(&who, amount)?;
            s.lp += amount;
            s.holders.insert(who, h);
            Ok(units)
        })
    }

    pub fn withdraw(&mut self, who: Pubkey, units: u64) -> Result<u64> {
        self.atomically(|s| s.withdraw_inner(who, units))
    }

    fn withdraw_inner(&mut self, who: Pubkey, units: u64) -> Result<u64> {
        let mut h = self.holder(who);
        let (lp, now) = (self.lp, self.now);
        let amount = self.vault.withdraw(&mut h, units, lp, now)?;
        self.lp -= amount;
        *self.wallets.entry(who).or_default() += amount;
        self.holders.insert(who, h);
        Ok(amount)
    }

    pub fn exit(&mut self, who: Pubkey) -> Result<u64> {
        self.atomically(|s| {
            s.compound_inner()?;
            let units = s.units(&who);
            s.withdraw_inner(who, units)
        })
    }

    pub fn transfer(&mut self, from: Pubkey, to: Pubkey, units: u64) -> Result<()> {
        self.atomically(|s| {
            require_keys_neq!(from, to, VaultError::SelfTransfer);
            let mut a = s.holder(from);
            let mut b = s.holder(to);
            let now = s.now;
            s.vault.transfer_units(&mut a, &mut b, units, now)?;
            s.holders.insert(from, a);
            s.holders.insert(to, b);
            Ok(())
        })
    }

    pub fn needs_compounding(&self) -> bool {
        self.vault.needs_compounding(self.reward_a, self.reward_b, self.now)
    }

    pub fn unlock_at(&self) -> i64 {
        self.vault.initialized_at + LOCK_PERIOD
    }

    /// Supply equals the sum of balances and never exceeds the LP backing it.
    pub fn assert_invariants(&self) {
        let sum: u64 = self.holders.values().map(|h| h.units).sum();
        assert_eq!(self.vault.total_supply, sum, "supply != Σ balances");
        assert!(
            self.vault.total_supply <= self.lp,
            "supply {} exceeds LP {}",
            self.vault.total_supply,
            self.lp
        );
    }

    /// LP per unit, scaled by 1e12.
    pub fn rate(&self) -> u128 {
        if self.vault.total_supply == 0 {
            return 0;
        }
        self.lp as u128 * 1_000_000_000_000 / self.vault.total_supply as u128
    }
}

pub fn error_code(err: Error) -> u32 {
    match err {
        Error::AnchorError(e) => e.error_code_number,
        Error::ProgramError(e) => panic!("expected a VaultError, got {e:?}"),
    }
}

pub fn assert_vault_err<T: std::fmt::Debug>(res: Result<T>, expected: VaultError) {
    match res {
        Ok(v) => panic!("expected {expected:?}, got Ok({v:?})"),
        Err(e) => assert_eq!(error_code(e), expected as u32 + ERROR_CODE_OFFSET, "expected {expected:?}"),
    }
}
