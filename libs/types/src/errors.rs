//! Error types for the vault's external collaborators
//!
//! Comprehensive error taxonomy using thiserror

use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Arithmetic failures in amount conversion
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Division by zero")]
    DivisionByZero,
}

/// Fungible-token errors, shared by the base asset and the share ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: Address,
        required: U256,
        available: U256,
    },

    #[error("Insufficient allowance from {owner} to {spender}: required {required}, available {available}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        required: U256,
        available: U256,
    },

    #[error("Invalid receiver: {receiver}")]
    InvalidReceiver { receiver: Address },

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,
}

/// External yield-protocol errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("External call reverted: {reason}")]
    Reverted { reason: String },

    #[error("Insufficient liquidity: requested {requested} assets, available {available}")]
    InsufficientLiquidity { requested: U256, available: U256 },

    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_display() {
        let err = TokenError::InsufficientBalance {
            account: Address::ZERO,
            required: U256::from(42u64),
            available: U256::from(7u64),
        };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("7"));
    }

    #[test]
    fn test_protocol_error_from_token() {
        let token_err = TokenError::Overflow;
        let protocol_err: ProtocolError = token_err.into();
        assert!(matches!(protocol_err, ProtocolError::Token(_)));
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::Reverted {
            reason: "market frozen".to_string(),
        };
        assert_eq!(err.to_string(), "External call reverted: market frozen");
    }
}
