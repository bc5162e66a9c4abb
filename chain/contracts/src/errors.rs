//! Contract-specific error types
//!
//! Every variant is a whole-operation abort: when a vault entry point returns
//! an error, no share balance, allowance, flag or event has changed.

use alloy_primitives::{Address, U256};
use thiserror::Error;
use types::errors::{MathError, ProtocolError, TokenError};

/// Vault errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VaultError {
    #[error("Unauthorized: {caller} is not the vault owner")]
    Unauthorized { caller: Address },

    #[error("Vault is paused")]
    VaultPaused,

    #[error("Deposit of {assets} is below the minimum of {minimum}")]
    BelowMinimumDeposit { assets: U256, minimum: U256 },

    #[error("Withdraw of {assets} exceeds max {max} for {owner}")]
    ExceededMaxWithdraw {
        owner: Address,
        assets: U256,
        max: U256,
    },

    #[error("Redeem of {shares} shares exceeds max {max} for {owner}")]
    ExceededMaxRedeem {
        owner: Address,
        shares: U256,
        max: U256,
    },

    #[error("Slippage exceeded: expected {expected}, received {received}, minimum {minimum}")]
    SlippageExceeded {
        expected: U256,
        received: U256,
        minimum: U256,
    },

    #[error("External protocol call failed: {0}")]
    ExternalProtocolCallFailed(ProtocolError),

    #[error("Insufficient allowance from {owner} to {spender}: required {required}, available {available}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        required: U256,
        available: U256,
    },

    #[error("Insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: Address,
        required: U256,
        available: U256,
    },

    #[error("Deposit of {assets} would mint zero shares")]
    ZeroShares { assets: U256 },

    #[error("Redeeming {shares} shares would release zero assets")]
    ZeroAssets { shares: U256 },

    #[error("Vault has outstanding shares but no backing assets")]
    Insolvent,

    #[error("Invalid receiver: {receiver}")]
    InvalidReceiver { receiver: Address },

    #[error("Dead shares cannot be moved")]
    DeadSharesLocked,

    #[error("Emergency mode is not active")]
    EmergencyModeInactive,

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

impl From<TokenError> for VaultError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InsufficientBalance {
                account,
                required,
                available,
            } => VaultError::InsufficientBalance {
                account,
                required,
                available,
            },
            TokenError::InsufficientAllowance {
                owner,
                spender,
                required,
                available,
            } => VaultError::InsufficientAllowance {
                owner,
                spender,
                required,
                available,
            },
            TokenError::InvalidReceiver { receiver } => VaultError::InvalidReceiver { receiver },
            TokenError::Overflow => VaultError::Math(MathError::Overflow),
        }
    }
}

impl From<ProtocolError> for VaultError {
    fn from(err: ProtocolError) -> Self {
        VaultError::ExternalProtocolCallFailed(err)
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Share decimals ({share}) must be >= asset decimals ({asset})")]
    DecimalsMismatch { asset: u8, share: u8 },

    #[error("Decimal scale 10^{offset} does not fit in 256 bits")]
    ScaleOverflow { offset: u8 },

    #[error("Slippage tolerance {bps} bps must be below {max}")]
    InvalidSlippageTolerance { bps: u64, max: u64 },

    #[error("Dead shares must be positive")]
    ZeroDeadShares,

    #[error("Invalid address for {field}: {address}")]
    InvalidAddress { field: &'static str, address: Address },

    #[error("Invalid config JSON: {0}")]
    Json(String),
}
