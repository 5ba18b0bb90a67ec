//! Decimal encoding of scaled values
//!
//! `parse_units` / `format_units` convert between human decimal strings
//! and [`ScaledValue`] without ever touching floating point, so a value
//! formatted and parsed back at the same scale is bit-identical.

use primitive_types::U256;

use crate::errors::{MirrorError, MirrorResult};
use crate::types::{Scale, ScaledValue};

fn invalid(input: &str, reason: &'static str) -> MirrorError {
    MirrorError::InvalidAmount { input: input.to_string(), reason }
}

/// Parse a decimal string such as `"12.5"` at `scale`
///
/// Signs, exponents and separators are rejected. Fractional digits beyond
/// the scale are only accepted when they are zeros, since anything else
/// would need rounding.
pub fn parse_units(text: &str, scale: Scale) -> MirrorResult<ScaledValue> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid(text, "empty amount"));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (trimmed, None),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(text, "not a decimal number"));
    }

    let fraction = match fraction {
        Some(f) if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) => {
            return Err(invalid(text, "not a decimal number"));
        }
        Some(f) => f.trim_end_matches('0'),
        None => "",
    };

    let decimals = scale.decimals() as usize;
    if fraction.len() > decimals {
        return Err(invalid(text, "more fractional digits than the scale allows"));
    }

    let whole = U256::from_dec_str(whole).map_err(|_| invalid(text, "out of range"))?;
    let fraction_raw = if fraction.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(fraction).map_err(|_| invalid(text, "out of range"))?
            * U256::exp10(decimals - fraction.len())
    };

    let raw = whole
        .checked_mul(scale.unit())
        .and_then(|w| w.checked_add(fraction_raw))
        .ok_or_else(|| invalid(text, "out of range"))?;

    Ok(ScaledValue::new(raw, scale))
}

/// Render a value exactly, e.g. `500.0` or `0.000001`
pub fn format_units(value: &ScaledValue) -> String {
    let digits = value.raw().to_string();
    let decimals = value.scale().decimals() as usize;

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };

    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Serde helper: U256 as a decimal string
pub mod dec_u256 {
    use primitive_types::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let text = String::deserialize(deserializer)?;
        U256::from_dec_str(&text).map_err(|_| serde::de::Error::custom(format!("invalid integer {:?}", text)))
    }
}
