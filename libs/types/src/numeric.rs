//! 256-bit amount arithmetic with explicit rounding
//!
//! Every conversion that divides states its rounding direction. Intermediate
//! products are checked; overflow is an error, never a wrap.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::MathError;

/// Percentage-math denominator (1 bp = 1/10000).
pub const BASIS_POINTS: u64 = 10_000;

/// Rounding direction for a division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rounding {
    /// Truncate toward zero
    Floor,
    /// Round up when there is a remainder
    Ceiling,
}

/// Computes `value * numerator / denominator` with the given rounding.
pub fn mul_div(
    value: U256,
    numerator: U256,
    denominator: U256,
    rounding: Rounding,
) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }

    let product = value.checked_mul(numerator).ok_or(MathError::Overflow)?;
    let quotient = product / denominator;

    match rounding {
        Rounding::Floor => Ok(quotient),
        Rounding::Ceiling => {
            if (product % denominator).is_zero() {
                Ok(quotient)
            } else {
                quotient.checked_add(U256::from(1u8)).ok_or(MathError::Overflow)
            }
        }
    }
}

/// `10^exp` as a U256.
pub fn pow10(exp: u8) -> Result<U256, MathError> {
    U256::from(10u8)
        .checked_pow(U256::from(exp))
        .ok_or(MathError::Overflow)
}

/// Lowest acceptable amount after a basis-point tolerance:
/// `floor(expected * (BASIS_POINTS - tolerance_bps) / BASIS_POINTS)`.
pub fn min_after_tolerance(expected: U256, tolerance_bps: u64) -> Result<U256, MathError> {
    let kept = BASIS_POINTS
        .checked_sub(tolerance_bps)
        .ok_or(MathError::Overflow)?;
    mul_div(
        expected,
        U256::from(kept),
        U256::from(BASIS_POINTS),
        Rounding::Floor,
    )
}

/// `amount * bps / BASIS_POINTS` with the given rounding.
pub fn bps_of(amount: U256, bps: u64, rounding: Rounding) -> Result<U256, MathError> {
    mul_div(amount, U256::from(bps), U256::from(BASIS_POINTS), rounding)
}

/// Render raw token units as a decimal with `decimals` fractional digits.
///
/// Returns `None` when the amount does not fit a 96-bit decimal mantissa.
pub fn to_decimal(amount: U256, decimals: u8) -> Option<Decimal> {
    let raw = u128::try_from(amount).ok()?;
    let signed = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(signed, u32::from(decimals)).ok()
}
