//! Risk Assessment
//!
//! Values collateral and debt in USD-WAD, derives the health factor and
//! classifies it into a tier.
//!
//! ```text
//! collateral_value = underlying * price / 10^underlying_decimals
//! max_borrow_value = collateral_value * threshold / WAD
//! health_factor    = collateral_value * threshold / debt_value
//! ```
//!
//! Tier boundaries are fixed policy. Exactly 1.0 is `Warning`: ties fall
//! into the riskier tier.

use core::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::constants::risk::{LIQUIDATION_HF_RAW, WARNING_HF_RAW};
use crate::errors::{MirrorError, MirrorResult};
use crate::types::{Scale, ScaledValue};

// ============ Tiers ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    /// No computable factor (no data yet, or the collateral is unpriced)
    Unknown,
    /// Liquidatable
    Danger,
    Warning,
    Safe,
}

impl RiskTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Danger => "danger",
            Self::Warning => "warning",
            Self::Safe => "safe",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============ Health Factor ============

/// Health factor of a position
///
/// A position without debt has no ratio at all rather than a huge one,
/// so it can never be compared against the tier boundaries by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum HealthFactor {
    Unknown,
    NoDebt,
    /// Ratio at HF-scale
    Ratio(ScaledValue),
}

impl HealthFactor {
    /// Convert a factor reported by the ledger at `scale` to HF-scale
    ///
    /// The pool reports `U256::MAX` for an account without debt.
    pub fn from_ledger_raw(raw: U256, scale: Scale) -> MirrorResult<Self> {
        if raw == U256::MAX {
            return Ok(Self::NoDebt);
        }
        Ok(Self::Ratio(ScaledValue::new(raw, scale).rescale(Scale::HF)?))
    }

    pub fn ratio(&self) -> Option<&ScaledValue> {
        match self {
            Self::Ratio(value) => Some(value),
            _ => None,
        }
    }

    pub fn tier(&self) -> RiskTier {
        match self {
            Self::Unknown => RiskTier::Unknown,
            Self::NoDebt => RiskTier::Safe,
            Self::Ratio(value) => {
                let raw = value.raw();
                if raw < U256::from(LIQUIDATION_HF_RAW) {
                    RiskTier::Danger
                } else if raw < U256::from(WARNING_HF_RAW) {
                    RiskTier::Warning
                } else {
                    RiskTier::Safe
                }
            }
        }
    }
}

// ============ Risk View ============

/// Derived risk figures of one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RiskView {
    /// USD-WAD
    pub collateral_value: ScaledValue,
    /// USD-WAD
    pub debt_value: ScaledValue,
    /// Collateral value weighted by the liquidation threshold (USD-WAD)
    pub max_borrow_value: ScaledValue,
    pub health_factor: HealthFactor,
    pub tier: RiskTier,
}

impl RiskView {
    /// View with nothing computable
    pub fn unknown() -> Self {
        Self {
            collateral_value: ScaledValue::zero(Scale::USD),
            debt_value: ScaledValue::zero(Scale::USD),
            max_borrow_value: ScaledValue::zero(Scale::USD),
            health_factor: HealthFactor::Unknown,
            tier: RiskTier::Unknown,
        }
    }
}

/// Value `amount` (any decimals) at `price` (USD per whole token) in USD-WAD
pub fn value_in_usd(amount: &ScaledValue, price: &ScaledValue) -> MirrorResult<ScaledValue> {
    amount.mul_div_scale(price, amount.scale())?.rescale(Scale::USD)
}

/// Assess a position from its collateral in underlying units
///
/// A zero oracle price means the collateral cannot be valued; the view is
/// then `Unknown` but still reports the debt value.
pub fn assess(
    collateral_underlying: &ScaledValue,
    oracle_price: &ScaledValue,
    debt_value: &ScaledValue,
    liquidation_threshold: &ScaledValue,
) -> MirrorResult<RiskView> {
    if oracle_price.is_zero() {
        return Ok(RiskView { debt_value: *debt_value, ..RiskView::unknown() });
    }

    let collateral_value = value_in_usd(collateral_underlying, oracle_price)?;
    assess_values(&collateral_value, debt_value, liquidation_threshold)
}

/// Assess a position from values already in USD-WAD
pub fn assess_values(
    collateral_value: &ScaledValue,
    debt_value: &ScaledValue,
    liquidation_threshold: &ScaledValue,
) -> MirrorResult<RiskView> {
    if collateral_value.scale() != debt_value.scale() {
        return Err(MirrorError::ScaleMismatch {
            left: collateral_value.scale().decimals(),
            right: debt_value.scale().decimals(),
        });
    }

    let max_borrow_value = crate::preview::max_borrow_value(collateral_value, liquidation_threshold)?;

    let health_factor = if debt_value.is_zero() {
        HealthFactor::NoDebt
    } else {
        let ratio = collateral_value.mul_div(liquidation_threshold, debt_value)?;
        HealthFactor::Ratio(ratio.rescale(Scale::HF)?)
    };

    Ok(RiskView {
        collateral_value: *collateral_value,
        debt_value: *debt_value,
        max_borrow_value,
        health_factor,
        tier: health_factor.tier(),
    })
}
