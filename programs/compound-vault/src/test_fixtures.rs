//! Account storage for handler tests that run without a validator.

use anchor_lang::error::{Error, ERROR_CODE_OFFSET};
use anchor_lang::prelude::*;
use crate::{error::VaultError, state::Vault};

/// SPL token account size; `state` sits at byte 108.
pub const TOKEN_ACCOUNT_LEN: usize = 165;

/// Backing storage for one `AccountInfo`.
pub struct TestAccount {
    pub key: Pubkey,
    pub owner: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
    pub writable: bool,
    pub executable: bool,
}

impl TestAccount {
    pub fn new(owner: Pubkey, data: Vec<u8>) -> Self {
        Self {
            key: Pubkey::new_unique(),
            owner,
            lamports: 1_000_000,
            data,
            writable: false,
            executable: false,
        }
    }

    /// An address nothing was ever created at.
    pub fn missing() -> Self {
        Self { lamports: 0, ..Self::new(anchor_lang::system_program::ID, vec![]) }
    }

    pub fn vault(vault: &Vault) -> Self {
        let mut data = Vec::with_capacity(Vault::LEN);
        vault.try_serialize(&mut data).unwrap();
        data.resize(Vault::LEN, 0);
        Self::new(crate::ID, data).writable()
    }

    pub fn token(mint: Pubkey, owner: Pubkey, amount: u64) -> Self {
        Self::new(anchor_spl::token::ID, token_data(mint, owner, amount))
    }

    pub fn at(mut self, key: Pubkey) -> Self {
        self.key = key;
        self
    }

    pub fn writable(mut self) -> Self {
        self.writable = true;
        self
    }

    pub fn executable(mut self) -> Self {
        self.executable = true;
        self
    }

    pub fn info(&mut self) -> AccountInfo<'_> {
        AccountInfo::new(
            &self.key,
            false,
            self.writable,
            &mut self.lamports,
            &mut self.data,
            &self.owner,
            self.executable,
            0,
        )
    }
}

/// Initialized token account: `mint(32) owner(32) amount(8)`, everything
/// else zero.
pub fn token_data(mint: Pubkey, owner: Pubkey, amount: u64) -> Vec<u8> {
    let mut data = vec![0u8; TOKEN_ACCOUNT_LEN];
    data[..32].copy_from_slice(mint.as_ref());
    data[32..64].copy_from_slice(owner.as_ref());
    data[64..72].copy_from_slice(&amount.to_le_bytes());
    data[108] = 1;
    data
}

/// A deployed vault registered at `index` with its own token account keys.
pub fn vault_at(registry: Pubkey, index: u64) -> Vault {
    Vault {
        registry,
        index,
        lp_mint: Pubkey::new_unique(),
        reward_a_mint: Pubkey::new_unique(),
        reward_b_mint: Pubkey::new_unique(),
        lp_account: Pubkey::new_unique(),
        reward_a_account: Pubkey::new_unique(),
        reward_b_account: Pubkey::new_unique(),
        initialized: true,
        ..Vault::default()
    }
}

pub fn assert_vault_err<T: std::fmt::Debug>(res: Result<T>, expected: VaultError) {
    match res {
        Ok(v) => panic!("expected {expected:?}, got Ok({v:?})"),
        Err(Error::AnchorError(e)) => {
            assert_eq!(e.error_code_number, expected as u32 + ERROR_CODE_OFFSET, "expected {expected:?}")
        }
        Err(Error::ProgramError(e)) => panic!("expected {expected:?}, got {e:?}"),
    }
}
