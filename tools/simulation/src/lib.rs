//! Simulation framework for the RiseFi vault
//!
//! In-memory collaborators and deterministic scenario runs for the vault's
//! accounting and redemption engine.
//!
//! # Modules
//! - `token`: Fungible base-asset token
//! - `yield_vault`: Share-based external yield protocol with fault injection
//! - `world`: Vault wired to both, with funded users
//! - `scenarios`: Inflation attack and seeded random operation walks

pub mod scenarios;
pub mod token;
pub mod world;
pub mod yield_vault;

use contracts::{ConfigError, VaultError};
use thiserror::Error;
use types::errors::{MathError, TokenError};

/// Crate version constant
pub const VERSION: &str = "0.1.0";

/// Simulation failures. A rejected vault operation inside a scenario is not
/// an error; these abort the run.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Vault configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Invariant violated: {0}")]
    InvariantViolated(String),
}
