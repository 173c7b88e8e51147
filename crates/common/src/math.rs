//! Fixed-Point Math Utilities
//!
//! Checked arithmetic helpers and wide-intermediate multiply-then-divide for
//! the 1e18-scaled accumulator math. Silent wraparound in the P/S/G
//! accumulators would corrupt the bookkeeping for every depositor, so every
//! operation here is checked and intermediate products go through `U256`.

use crate::errors::{KeelError, KeelResult};
use primitive_types::U256;

/// Safe addition with overflow check
pub fn safe_add(a: u64, b: u64) -> KeelResult<u64> {
    a.checked_add(b).ok_or(KeelError::Overflow)
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u64, b: u64) -> KeelResult<u64> {
    a.checked_sub(b).ok_or(KeelError::Underflow)
}

/// Safe u128 addition with overflow check
pub fn safe_add_u128(a: u128, b: u128) -> KeelResult<u128> {
    a.checked_add(b).ok_or(KeelError::Overflow)
}

/// Safe u128 subtraction with underflow check
pub fn safe_sub_u128(a: u128, b: u128) -> KeelResult<u128> {
    a.checked_sub(b).ok_or(KeelError::Underflow)
}

/// Computes `a * b / denom` with a 256-bit intermediate product.
///
/// Errors with `DivisionByZero` for a zero denominator and `Overflow` if the
/// quotient does not fit in `u128`.
pub fn mul_div(a: u128, b: u128, denom: u128) -> KeelResult<u128> {
    if denom == 0 {
        return Err(KeelError::DivisionByZero);
    }
    // Product of two u128 always fits in U256
    let wide = U256::from(a) * U256::from(b) / U256::from(denom);
    if wide > U256::from(u128::MAX) {
        return Err(KeelError::Overflow);
    }
    Ok(wide.as_u128())
}

/// Narrow a u128 quotient back to a token amount
pub fn to_token_amount(value: u128) -> KeelResult<u64> {
    u64::try_from(value).map_err(|_| KeelError::Overflow)
}
