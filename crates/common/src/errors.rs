//! Error Types for lendmirror
//!
//! Typed errors with stable codes for logging. All of them come from pure
//! computations, so none of them implies partially applied state.

use thiserror::Error;

use crate::types::ScaledValue;

/// Result type alias for mirror computations
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Main error enum for the calculator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    // ============ Math Errors ============
    /// Denominator was zero where the ledger would revert
    #[error("division by zero")]
    DivisionByZero,

    /// Result does not fit in 256 bits
    #[error("arithmetic overflow")]
    Overflow,

    /// Subtraction went below zero
    #[error("arithmetic underflow")]
    Underflow,

    /// Two values with different scales were combined without rescaling
    #[error("scale mismatch: {left} decimals vs {right} decimals")]
    ScaleMismatch { left: u8, right: u8 },

    /// Resulting scale is negative or wider than a U256 can hold
    #[error("scale out of range: {decimals} decimals")]
    ScaleOutOfRange { decimals: i32 },

    // ============ Input Errors ============
    /// Amount text could not be decoded at the requested scale
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: &'static str },

    /// Account address is not 20 hex-encoded bytes
    #[error("invalid address {input:?}")]
    InvalidAddress { input: String },

    // ============ Preview Errors ============
    /// Requested borrow is below the pool minimum
    #[error("amount {amount} is below the pool minimum {minimum}")]
    BelowMinimum { amount: ScaledValue, minimum: ScaledValue },

    /// Requested borrow would exceed the maximum borrow value
    #[error("requested value {requested} exceeds remaining capacity {headroom}")]
    ExceedsCapacity { requested: ScaledValue, headroom: ScaledValue },

    /// More shares requested than held
    #[error("insufficient shares: holding {held}, requested {requested}")]
    InsufficientShares { held: ScaledValue, requested: ScaledValue },

    /// Collateral has no price, so no capacity can be derived
    #[error("collateral is unpriced")]
    Unpriced,
}

impl MirrorError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::DivisionByZero => "E001_DIV_ZERO",
            Self::Overflow => "E002_OVERFLOW",
            Self::Underflow => "E003_UNDERFLOW",
            Self::ScaleMismatch { .. } => "E004_SCALE_MISMATCH",
            Self::ScaleOutOfRange { .. } => "E005_SCALE_RANGE",
            Self::InvalidAmount { .. } => "E010_INVALID_AMOUNT",
            Self::InvalidAddress { .. } => "E011_INVALID_ADDRESS",
            Self::BelowMinimum { .. } => "E020_BELOW_MINIMUM",
            Self::ExceedsCapacity { .. } => "E021_EXCEEDS_CAPACITY",
            Self::InsufficientShares { .. } => "E022_INSUFFICIENT_SHARES",
            Self::Unpriced => "E030_UNPRICED",
        }
    }

    /// True for errors that only malformed ledger data can produce.
    /// A snapshot hitting one of these is flagged inconsistent.
    pub fn is_data_fault(&self) -> bool {
        matches!(
            self,
            Self::DivisionByZero
                | Self::Overflow
                | Self::Underflow
                | Self::ScaleMismatch { .. }
                | Self::ScaleOutOfRange { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let one = ScaledValue::one(crate::types::Scale::WAD);
        let errors = [
            MirrorError::DivisionByZero,
            MirrorError::Overflow,
            MirrorError::Underflow,
            MirrorError::ScaleMismatch { left: 18, right: 6 },
            MirrorError::ScaleOutOfRange { decimals: -1 },
            MirrorError::InvalidAmount { input: "x".into(), reason: "not a number" },
            MirrorError::InvalidAddress { input: "0x".into() },
            MirrorError::BelowMinimum { amount: one, minimum: one },
            MirrorError::ExceedsCapacity { requested: one, headroom: one },
            MirrorError::InsufficientShares { held: one, requested: one },
            MirrorError::Unpriced,
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_data_faults() {
        assert!(MirrorError::DivisionByZero.is_data_fault());
        assert!(!MirrorError::Unpriced.is_data_fault());
    }
}
