//! Read-only previews of borrow and withdraw actions
//!
//! These answer "would this go through?" from a snapshot's figures with
//! the same fixed-point comparisons the pool applies. They never submit
//! anything.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::{MirrorError, MirrorResult};
use crate::risk::{value_in_usd, HealthFactor, RiskView};
use crate::shares::shares_to_underlying;
use crate::types::{Scale, ScaledValue};

/// Collateral value weighted by the liquidation threshold (USD-WAD)
pub fn max_borrow_value(collateral_value: &ScaledValue, liquidation_threshold: &ScaledValue) -> MirrorResult<ScaledValue> {
    collateral_value.mul_div_scale(liquidation_threshold, Scale::WAD)
}

/// Value still borrowable before reaching the maximum; zero at or above it
pub fn borrow_headroom(max_borrow_value: &ScaledValue, debt_value: &ScaledValue) -> MirrorResult<ScaledValue> {
    max_borrow_value.saturating_sub(debt_value)
}

fn require_positive(amount: &ScaledValue) -> MirrorResult<()> {
    if amount.is_zero() {
        return Err(MirrorError::InvalidAmount { input: amount.to_string(), reason: "amount must be greater than zero" });
    }
    Ok(())
}

/// Accepted borrow request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowPreview {
    /// Requested amount in borrow-token units
    pub amount: ScaledValue,
    /// Requested amount in USD-WAD
    pub requested_value: ScaledValue,
    /// Capacity left after the borrow (USD-WAD)
    pub headroom_after: ScaledValue,
}

/// Check a borrow request of `amount` borrow tokens against the pool
/// minimum and the position's remaining capacity
pub fn check_borrow(
    amount: &ScaledValue,
    borrow_price: &ScaledValue,
    min_borrow: &ScaledValue,
    risk: &RiskView,
) -> MirrorResult<BorrowPreview> {
    require_positive(amount)?;
    if amount.checked_cmp(min_borrow)? == Ordering::Less {
        return Err(MirrorError::BelowMinimum { amount: *amount, minimum: *min_borrow });
    }

    if matches!(risk.health_factor, HealthFactor::Unknown) || borrow_price.is_zero() {
        return Err(MirrorError::Unpriced);
    }

    let requested_value = value_in_usd(amount, borrow_price)?;
    let headroom = borrow_headroom(&risk.max_borrow_value, &risk.debt_value)?;

    if requested_value.checked_cmp(&headroom)? == Ordering::Greater {
        return Err(MirrorError::ExceedsCapacity { requested: requested_value, headroom });
    }

    Ok(BorrowPreview {
        amount: *amount,
        requested_value,
        headroom_after: headroom.checked_sub(&requested_value)?,
    })
}

/// Outcome of burning `shares` at the current exchange rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawPreview {
    pub shares: ScaledValue,
    /// Underlying collateral released
    pub underlying: ScaledValue,
    pub remaining_shares: ScaledValue,
}

pub fn preview_withdraw(
    shares: &ScaledValue,
    held: &ScaledValue,
    total_shares: &ScaledValue,
    total_underlying: &ScaledValue,
) -> MirrorResult<WithdrawPreview> {
    require_positive(shares)?;
    if shares.checked_cmp(held)? == Ordering::Greater {
        return Err(MirrorError::InsufficientShares { held: *held, requested: *shares });
    }

    Ok(WithdrawPreview {
        shares: *shares,
        underlying: shares_to_underlying(shares, total_shares, total_underlying)?,
        remaining_shares: held.checked_sub(shares)?,
    })
}
