//! Compound Vault Rust SDK
//!
//! Client for pooled LP vaults on Solana. Each vault holds one router pool's
//! LP token, harvests the pool's two reward tokens back into LP, and issues
//! transferable units to stakers. Keepers use [`VaultClient::check_work`] and
//! [`VaultClient::perform_work`] to trigger compounding across the registry.
//!
//! No Anchor dependency required.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use compound_vault_sdk::VaultClient;
//! use solana_sdk::{pubkey::Pubkey, signature::Keypair};
//! use std::str::FromStr;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = VaultClient::devnet();
//!     let keypair = Keypair::new(); // use a funded keypair
//!
//!     let lp_mint = Pubkey::from_str("So11111111111111111111111111111111111111112")?;
//!
//!     // 1. Inspect the vault
//!     let vault = client.vault_info(lp_mint).await?;
//!     println!("{}: {} LP backing {} units", vault.symbol, vault.lp_balance, vault.total_supply);
//!
//!     // 2. Stake 1 LP (the vault compounds first, then prices the deposit)
//!     let staked = client.stake(&keypair, lp_mint, 1_000_000_000).await?;
//!     println!("Staked! ~{} units, tx: {}", staked.estimated_units, staked.signature);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Feature Overview
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`VaultClient::deploy_vault`] | Deploy and bootstrap a vault for a router pool |
//! | [`VaultClient::set_params`] | Governor fee / interval update for many vaults |
//! | [`VaultClient::stake`] | Deposit LP, receive units |
//! | [`VaultClient::withdraw`] | Burn units, receive LP |
//! | [`VaultClient::exit`] | Compound, then withdraw everything |
//! | [`VaultClient::transfer_units`] | Move units to another wallet |
//! | [`VaultClient::check_work`] | First vault in a range that needs compounding, as the program answers in simulation |
//! | [`VaultClient::needs_compounding`] | The program's compounding predicate for one vault |
//! | [`VaultClient::perform_work`] | Compound the vault named by `check_work` |
//! | [`VaultClient::vault_info`] | Vault state, balances, redemption rate |
//! | [`VaultClient::my_positions`] | All unit balances for an owner |

pub mod client;
pub mod error;
pub mod instructions;
pub mod math;
pub mod state;
pub mod types;

pub use client::VaultClient;
pub use error::{Error, Result};
pub use types::*;
