//! SDK error type.

use solana_sdk::pubkey::Pubkey;

/// All errors returned by the Compound Vault SDK.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── RPC / network ────────────────────────────────────────────────────────
    /// A Solana JSON-RPC call failed.
    #[error("RPC error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),

    /// A read-only program call failed during simulation.
    #[error("Simulation failed: {0}")]
    Simulation(String),

    // ── Discovery ────────────────────────────────────────────────────────────
    #[error("Registry not found at {0}; run init-registry first")]
    RegistryNotFound(Pubkey),

    /// No vault has been deployed for this LP mint.
    #[error("No vault deployed for LP mint {0}")]
    VaultNotFound(Pubkey),

    #[error("No vault registered at index {0}")]
    VaultIndexNotFound(u64),

    #[error("No position in vault {vault} for owner {owner}")]
    PositionNotFound { vault: Pubkey, owner: Pubkey },

    // ── Arithmetic ───────────────────────────────────────────────────────────
    #[error("Integer overflow in vault math")]
    MathOverflow,

    // ── Account parsing ──────────────────────────────────────────────────────
    /// Raw account bytes could not be deserialized.
    #[error("Account parse error at offset {offset}: {reason}")]
    ParseError { offset: usize, reason: String },

    // ── Validation ───────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience alias so every module can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;
