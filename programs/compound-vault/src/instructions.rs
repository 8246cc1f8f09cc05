#![allow(ambiguous_glob_reexports)]

pub mod vault_math;
pub mod liquefy;
pub mod initialize_registry;
pub mod set_governor;
pub mod deploy_vault;
pub mod set_vaults_params;
pub mod set_vaults_params_batch;
pub mod compound;
pub mod stake;
pub mod stake_with_permit;
pub mod withdraw;
pub mod exit;
pub mod transfer_units;
pub mod check_work;
pub mod perform_work;
pub mod needs_compounding;

pub use liquefy::*;
pub use initialize_registry::*;
pub use set_governor::*;
pub use deploy_vault::*;
pub use set_vaults_params::*;
pub use set_vaults_params_batch::*;
pub use compound::*;
pub use stake::*;
pub use stake_with_permit::*;
pub use withdraw::*;
pub use exit::*;
pub use transfer_units::*;
pub use check_work::*;
pub use perform_work::*;
pub use needs_compounding::*;
