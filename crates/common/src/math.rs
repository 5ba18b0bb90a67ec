//! Fixed-Point Math
//!
//! Multiply-then-divide with a 512-bit intermediate, truncating toward
//! zero exactly like the ledger's integer division. Any rounding drift
//! here would show a health factor different from the one that actually
//! triggers liquidation, so nothing in this module rounds up or goes
//! through floating point.

use core::cmp::Ordering;

use primitive_types::{U256, U512};

use crate::errors::{MirrorError, MirrorResult};
use crate::types::{Scale, ScaledValue};

/// Compute `floor(a * b / denominator)`
///
/// The product is formed in 512 bits, so it never overflows; only a
/// quotient that does not fit back into 256 bits is an error.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> MirrorResult<U256> {
    if denominator.is_zero() {
        return Err(MirrorError::DivisionByZero);
    }

    let product: U512 = a.full_mul(b);
    let quotient = product / U512::from(denominator);

    U256::try_from(quotient).map_err(|_| MirrorError::Overflow)
}

fn ensure_same_scale(left: &ScaledValue, right: &ScaledValue) -> MirrorResult<Scale> {
    if left.scale() != right.scale() {
        return Err(MirrorError::ScaleMismatch {
            left: left.scale().decimals(),
            right: right.scale().decimals(),
        });
    }
    Ok(left.scale())
}

impl ScaledValue {
    /// `self * rhs / denominator`, truncating
    ///
    /// Result scale is `self + rhs - denominator`, e.g. shares * assets /
    /// shares lands in asset decimals.
    pub fn mul_div(&self, rhs: &ScaledValue, denominator: &ScaledValue) -> MirrorResult<ScaledValue> {
        let scale = Scale::from_signed(
            self.scale().decimals() as i32 + rhs.scale().decimals() as i32
                - denominator.scale().decimals() as i32,
        )?;
        let raw = mul_div(self.raw(), rhs.raw(), denominator.raw())?;
        Ok(ScaledValue::new(raw, scale))
    }

    /// `self * rhs / 10^divisor`, truncating
    ///
    /// Result scale is `self + rhs - divisor`.
    pub fn mul_div_scale(&self, rhs: &ScaledValue, divisor: Scale) -> MirrorResult<ScaledValue> {
        let scale = Scale::from_signed(
            self.scale().decimals() as i32 + rhs.scale().decimals() as i32
                - divisor.decimals() as i32,
        )?;
        let raw = mul_div(self.raw(), rhs.raw(), divisor.unit())?;
        Ok(ScaledValue::new(raw, scale))
    }

    /// Express the same amount at `target`; narrowing truncates
    pub fn rescale(&self, target: Scale) -> MirrorResult<ScaledValue> {
        let from = self.scale().decimals();
        let to = target.decimals();
        let raw = match from.cmp(&to) {
            Ordering::Equal => self.raw(),
            Ordering::Less => self
                .raw()
                .checked_mul(U256::exp10((to - from) as usize))
                .ok_or(MirrorError::Overflow)?,
            Ordering::Greater => self.raw() / U256::exp10((from - to) as usize),
        };
        Ok(ScaledValue::new(raw, target))
    }

    pub fn checked_add(&self, rhs: &ScaledValue) -> MirrorResult<ScaledValue> {
        let scale = ensure_same_scale(self, rhs)?;
        let raw = self.raw().checked_add(rhs.raw()).ok_or(MirrorError::Overflow)?;
        Ok(ScaledValue::new(raw, scale))
    }

    pub fn checked_sub(&self, rhs: &ScaledValue) -> MirrorResult<ScaledValue> {
        let scale = ensure_same_scale(self, rhs)?;
        let raw = self.raw().checked_sub(rhs.raw()).ok_or(MirrorError::Underflow)?;
        Ok(ScaledValue::new(raw, scale))
    }

    /// Subtract, clamping at zero
    pub fn saturating_sub(&self, rhs: &ScaledValue) -> MirrorResult<ScaledValue> {
        let scale = ensure_same_scale(self, rhs)?;
        Ok(ScaledValue::new(self.raw().saturating_sub(rhs.raw()), scale))
    }

    /// Order two values of the same scale
    pub fn checked_cmp(&self, rhs: &ScaledValue) -> MirrorResult<Ordering> {
        ensure_same_scale(self, rhs)?;
        Ok(self.raw().cmp(&rhs.raw()))
    }

    /// Lossy float view for display-only projections
    pub fn to_f64_lossy(&self) -> f64 {
        let limbs = self.raw().0;
        let mut value = 0.0f64;
        for limb in limbs.iter().rev() {
            value = value * 18_446_744_073_709_551_616.0 + *limb as f64;
        }
        value / 10f64.powi(self.scale().decimals() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAD: u128 = 1_000_000_000_000_000_000;

    fn wad(raw: u128) -> ScaledValue {
        ScaledValue::from_raw_u128(raw, Scale::WAD)
    }

    fn usdc(raw: u128) -> ScaledValue {
        ScaledValue::from_raw_u128(raw, Scale::new(6).unwrap())
    }

    #[test]
    fn test_mul_div_truncates() {
        // 10 * 10 / 3 = 33.33.. -> 33
        assert_eq!(mul_div(U256::from(10u64), U256::from(10u64), U256::from(3u64)), Ok(U256::from(33u64)));
        // 1 * 1 / 2 = 0.5 -> 0
        assert_eq!(mul_div(U256::one(), U256::one(), U256::from(2u64)), Ok(U256::zero()));
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // MAX * MAX / MAX needs 512 bits in between
        assert_eq!(mul_div(U256::MAX, U256::MAX, U256::MAX), Ok(U256::MAX));
        // MAX * 2 / 4 = MAX / 2
        assert_eq!(mul_div(U256::MAX, U256::from(2u64), U256::from(4u64)), Ok(U256::MAX / U256::from(2u64)));
    }

    #[test]
    fn test_mul_div_errors() {
        assert_eq!(mul_div(U256::one(), U256::one(), U256::zero()), Err(MirrorError::DivisionByZero));
        assert_eq!(mul_div(U256::MAX, U256::from(2u64), U256::one()), Err(MirrorError::Overflow));
    }

    #[test]
    fn test_scaled_mul_div_scale_arithmetic() {
        // 1.5 WAD * 2 USDC / 1 WAD = 3 USDC
        let result = wad(3 * WAD / 2).mul_div(&usdc(2_000_000), &wad(WAD)).unwrap();
        assert_eq!(result, usdc(3_000_000));
    }

    #[test]
    fn test_mul_div_scale() {
        // 100 WAD * 0.8 WAD / 1e18 = 80 WAD
        let result = wad(100 * WAD).mul_div_scale(&wad(8 * WAD / 10), Scale::WAD).unwrap();
        assert_eq!(result, wad(80 * WAD));
    }

    #[test]
    fn test_negative_scale_rejected() {
        let result = usdc(1).mul_div(&usdc(1), &wad(1));
        assert_eq!(result, Err(MirrorError::ScaleOutOfRange { decimals: -6 }));
    }

    #[test]
    fn test_rescale() {
        assert_eq!(usdc(1_500_000).rescale(Scale::WAD).unwrap(), wad(3 * WAD / 2));
        // narrowing truncates the 7th decimal
        assert_eq!(wad(1_999_999_999_999_999_999).rescale(Scale::new(6).unwrap()).unwrap(), usdc(1_999_999));
        let huge = ScaledValue::new(U256::MAX, Scale::new(0).unwrap());
        assert_eq!(huge.rescale(Scale::WAD), Err(MirrorError::Overflow));
    }

    #[test]
    fn test_add_sub_require_same_scale() {
        assert_eq!(wad(1).checked_add(&wad(2)).unwrap(), wad(3));
        assert_eq!(
            wad(1).checked_add(&usdc(1)),
            Err(MirrorError::ScaleMismatch { left: 18, right: 6 })
        );
        assert_eq!(wad(1).checked_sub(&wad(2)), Err(MirrorError::Underflow));
        assert_eq!(wad(1).saturating_sub(&wad(2)).unwrap(), wad(0));
    }

    #[test]
    fn test_checked_cmp() {
        assert_eq!(wad(1).checked_cmp(&wad(2)), Ok(Ordering::Less));
        assert!(wad(1).checked_cmp(&usdc(1)).is_err());
    }

    #[test]
    fn test_to_f64_lossy() {
        assert_eq!(wad(3 * WAD / 2).to_f64_lossy(), 1.5);
        assert_eq!(usdc(0).to_f64_lossy(), 0.0);
    }
}
