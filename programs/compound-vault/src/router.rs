use anchor_lang::prelude::*;
use anchor_lang::solana_program::{
    instruction::{AccountMeta, Instruction},
    program::invoke_signed,
};
use crate::{constants::ROUTER_MIN_AMOUNT, error::VaultError};

// ─── Router CPI contract ───────────────────────────────────────────────────
// The router is any Anchor pool program exposing `add_liquidity` with the
// account order below and a pool account laid out as:
//   [0..8)     discriminator
//   [8..40)    mint A
//   [40..72)   mint B
//   [72..104)  LP mint
//   [104..136) pool token A account
//   [136..168) pool token B account

/// sha256("global:add_liquidity")[..8]
pub const ADD_LIQUIDITY_DISCRIMINATOR: [u8; 8] = [181, 157, 89, 67, 143, 182, 52, 72];

const POOL_MIN_LEN: usize = 168;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouterPool {
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub lp_mint: Pubkey,
    pub token_a: Pubkey,
    pub token_b: Pubkey,
}

impl RouterPool {
    pub fn parse(data: &[u8]) -> Result<Self> {
        require!(data.len() >= POOL_MIN_LEN, VaultError::PoolMismatch);
        let key = |off: usize| -> Result<Pubkey> {
            let bytes: [u8; 32] = data[off..off + 32]
                .try_into()
                .map_err(|_| error!(VaultError::PoolMismatch))?;
            Ok(Pubkey::new_from_array(bytes))
        };
        Ok(Self {
            mint_a: key(8)?,
            mint_b: key(40)?,
            lp_mint: key(72)?,
            token_a: key(104)?,
            token_b: key(136)?,
        })
    }

    /// Load a pool account, requiring it to be owned by `router_program`.
    pub fn load(pool: &AccountInfo, router_program: &Pubkey) -> Result<Self> {
        require_keys_eq!(*pool.owner, *router_program, VaultError::PoolMismatch);
        let data = pool.try_borrow_data()?;
        Self::parse(&data)
    }

    /// The pool issues `lp_mint` against exactly this reward pair.
    pub fn matches(&self, lp_mint: &Pubkey, reward_a_mint: &Pubkey, reward_b_mint: &Pubkey) -> bool {
        self.lp_mint == *lp_mint && self.mint_a == *reward_a_mint && self.mint_b == *reward_b_mint
    }
}

pub fn add_liquidity_data(
    amount_a_desired: u64,
    amount_b_desired: u64,
    amount_a_min: u64,
    amount_b_min: u64,
    deadline: i64,
) -> Vec<u8> {
    let mut data = Vec::with_capacity(8 + 8 * 5);
    data.extend_from_slice(&ADD_LIQUIDITY_DISCRIMINATOR);
    data.extend_from_slice(&amount_a_desired.to_le_bytes());
    data.extend_from_slice(&amount_b_desired.to_le_bytes());
    data.extend_from_slice(&amount_a_min.to_le_bytes());
    data.extend_from_slice(&amount_b_min.to_le_bytes());
    data.extend_from_slice(&deadline.to_le_bytes());
    data
}

pub struct AddLiquidity<'a, 'info> {
    pub router_program: &'a AccountInfo<'info>,
    pub pool: &'a AccountInfo<'info>,
    /// Signs as the vault authority PDA
    pub owner: &'a AccountInfo<'info>,
    pub owner_token_a: &'a AccountInfo<'info>,
    pub owner_token_b: &'a AccountInfo<'info>,
    pub pool_token_a: &'a AccountInfo<'info>,
    pub pool_token_b: &'a AccountInfo<'info>,
    pub lp_mint: &'a AccountInfo<'info>,
    pub owner_lp: &'a AccountInfo<'info>,
    pub token_program: &'a AccountInfo<'info>,
}

impl<'a, 'info> AddLiquidity<'a, 'info> {
    /// Pair `amount_a`/`amount_b` into LP with nonzero minimums and a
    /// same-slot deadline. The router decides how much of each it consumes.
    pub fn invoke(
        &self,
        amount_a: u64,
        amount_b: u64,
        deadline: i64,
        signer_seeds: &[&[&[u8]]],
    ) -> Result<()> {
        let ix = Instruction {
            program_id: self.router_program.key(),
            accounts: vec![
                AccountMeta::new(self.pool.key(), false),
                AccountMeta::new_readonly(self.owner.key(), true),
                AccountMeta::new(self.owner_token_a.key(), false),
                AccountMeta::new(self.owner_token_b.key(), false),
                AccountMeta::new(self.pool_token_a.key(), false),
                AccountMeta::new(self.pool_token_b.key(), false),
                AccountMeta::new(self.lp_mint.key(), false),
                AccountMeta::new(self.owner_lp.key(), false),
                AccountMeta::new_readonly(self.token_program.key(), false),
            ],
            data: add_liquidity_data(
                amount_a,
                amount_b,
                ROUTER_MIN_AMOUNT,
                ROUTER_MIN_AMOUNT,
                deadline,
            ),
        };
        invoke_signed(
            &ix,
            &[
                self.pool.clone(),
                self.owner.clone(),
                self.owner_token_a.clone(),
                self.owner_token_b.clone(),
                self.pool_token_a.clone(),
                self.pool_token_b.clone(),
                self.lp_mint.clone(),
                self.owner_lp.clone(),
                self.token_program.clone(),
                self.router_program.clone(),
            ],
            signer_seeds,
        )?;
        Ok(())
    }
}
