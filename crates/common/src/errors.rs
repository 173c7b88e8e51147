//! Error Types for the Keel Protocol
//!
//! Typed errors with stable codes for debugging and host-side handling.
//! All validation happens before any state mutation: an `Err` from any
//! engine operation means zero observable side effects.

use crate::types::CollateralId;

/// Result type alias for Keel operations
pub type KeelResult<T> = Result<T, KeelError>;

/// Main error enum for all Keel protocol errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeelError {
    // ============ Amount Errors ============
    /// Invalid amount provided
    InvalidAmount { amount: u64, reason: AmountErrorReason },

    /// Requested amount exceeds the available balance
    InsufficientBalance { available: u64, requested: u64 },

    // ============ Stability Pool Errors ============
    /// Offset debt exceeds what the pool currently holds
    InsufficientPoolBalance { available: u64, required: u64 },

    /// No deposit record exists for this depositor
    DepositNotFound { depositor: [u8; 32] },

    /// No collateral or reward gains to claim
    NoRewardsToClaim,

    // ============ Registry Errors ============
    /// No pool registered for this collateral asset
    PoolNotFound { asset: CollateralId },

    /// A pool for this collateral asset already exists
    PoolAlreadyRegistered { asset: CollateralId },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Arithmetic underflow occurred
    Underflow,

    /// Division by zero
    DivisionByZero,
}

/// Reasons for amount-related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountErrorReason {
    /// Amount is zero when non-zero required
    Zero,
    /// Amount exceeds maximum
    TooLarge,
    /// Amount below minimum
    TooSmall,
    /// Amount doesn't match expected
    Mismatch,
}

impl KeelError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "E010_INVALID_AMOUNT",
            Self::InsufficientBalance { .. } => "E011_INSUFFICIENT_BALANCE",
            Self::InsufficientPoolBalance { .. } => "E050_POOL_INSUFFICIENT",
            Self::DepositNotFound { .. } => "E051_DEPOSIT_NOT_FOUND",
            Self::NoRewardsToClaim => "E052_NO_REWARDS",
            Self::PoolNotFound { .. } => "E060_POOL_NOT_FOUND",
            Self::PoolAlreadyRegistered { .. } => "E061_POOL_EXISTS",
            Self::Overflow => "E080_OVERFLOW",
            Self::Underflow => "E081_UNDERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
        }
    }

    /// Returns true if this error is recoverable (user can fix it)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. }
                | Self::InsufficientBalance { .. }
                | Self::NoRewardsToClaim
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            KeelError::InvalidAmount {
                amount: 0,
                reason: AmountErrorReason::Zero,
            },
            KeelError::InsufficientBalance {
                available: 10,
                requested: 20,
            },
            KeelError::InsufficientPoolBalance {
                available: 0,
                required: 100,
            },
            KeelError::DepositNotFound {
                depositor: [0u8; 32],
            },
            KeelError::NoRewardsToClaim,
            KeelError::PoolNotFound {
                asset: CollateralId::new([0u8; 32]),
            },
            KeelError::PoolAlreadyRegistered {
                asset: CollateralId::new([0u8; 32]),
            },
            KeelError::Overflow,
            KeelError::Underflow,
            KeelError::DivisionByZero,
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_recoverability() {
        assert!(KeelError::NoRewardsToClaim.is_recoverable());
        assert!(!KeelError::Overflow.is_recoverable());
        assert!(!KeelError::PoolNotFound {
            asset: CollateralId::new([0u8; 32])
        }
        .is_recoverable());
    }
}
