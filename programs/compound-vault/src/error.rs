use anchor_lang::prelude::*;

#[error_code]
pub enum VaultError {
    // ── Authorization ────────────────────────────────────────────────────────
    #[msg("Caller is not authorized for this operation")]
    Unauthorized,

    // ── Lifecycle / state ────────────────────────────────────────────────────
    #[msg("Vault is already initialized")]
    AlreadyInitialized,
    #[msg("Vault LP balance is below the initialization amount or the minimum")]
    InsufficientInitializationAmount,
    #[msg("Fee rate exceeds the maximum")]
    ExcessiveFeeValue,
    #[msg("Parameter arrays have inconsistent lengths")]
    InconsistentParamsLength,
    #[msg("A vault is already deployed for this LP mint")]
    AlreadyDeployed,
    #[msg("Account is not a vault of this registry for the given LP mint")]
    InvalidVault,
    #[msg("Vault has not been initialized")]
    VaultNotInitialized,
    #[msg("Automation interval must not be negative")]
    InvalidAutomationInterval,
    #[msg("Symbol is longer than 16 bytes")]
    SymbolTooLong,
    #[msg("Router pool does not match the LP and reward mints")]
    PoolMismatch,
    #[msg("Not enough vault accounts supplied for the requested range")]
    VaultAccountsMissing,
    #[msg("Permit deadline has passed")]
    PermitExpired,
    #[msg("Sender and recipient are the same")]
    SelfTransfer,
    #[msg("Token mint does not match vault")]
    MintMismatch,
    #[msg("Fee recipient LP account is missing or not a token account")]
    InvalidFeeAccount,

    // ── Degenerate values ────────────────────────────────────────────────────
    #[msg("Stake amount must be greater than zero")]
    ZeroStakeAmount,
    #[msg("Deposit is too small to mint any units")]
    ZeroUnitsMinted,
    #[msg("Units to burn must be greater than zero")]
    ZeroUnitsBurned,
    #[msg("Holder does not own enough units")]
    InsufficientUnits,
    #[msg("Math overflow")]
    MathOverflow,

    // ── Lock ─────────────────────────────────────────────────────────────────
    #[msg("Initializer units are locked")]
    InitializerLocked,
}
