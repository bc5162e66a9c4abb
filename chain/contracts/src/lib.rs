//! Accounting and redemption engine for a single-asset yield vault
//!
//! Users deposit a stable base asset (USDC) and receive proportional vault
//! shares (rfUSDC). All capital sits in one external share-based yield
//! protocol; the share price grows as that position compounds.
//!
//! # Modules
//! - `config`: Construction-time parameters
//! - `conversion`: Asset/share arithmetic with directional rounding
//! - `errors`: Contract-specific error types
//! - `events`: Records emitted by committed operations
//! - `ledger`: Share balances, allowances and supply
//! - `security`: Owner guard, pause guard, emergency switch
//! - `vault`: Vault state, reads, deposit/mint path, administration
//! - `redemption`: Two-phase withdraw/redeem, emergency exit
//!
//! # Version
//! v0.1.0

pub mod config;
pub mod conversion;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod redemption;
pub mod security;
pub mod vault;

pub use config::VaultConfig;
pub use errors::{ConfigError, VaultError};
pub use events::VaultEvent;
pub use redemption::{RedemptionPhase, RedemptionRequest, SettledRedemption};
pub use vault::Vault;

/// Vault interface version, frozen after release
pub const VAULT_INTERFACE_VERSION: &str = "1.0.0";
