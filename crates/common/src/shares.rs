//! Share Conversion
//!
//! Collateral is held as shares of the pool. A share's value in underlying
//! moves with the pool's total underlying, independently of share supply.

use crate::errors::{MirrorError, MirrorResult};
use crate::types::ScaledValue;

/// Underlying collateral claimed by `user_shares`
///
/// `user_shares * total_underlying / total_shares`, truncating. With no
/// shares minted yet there is no exchange rate and the result is zero.
/// The result is in the underlying's scale.
pub fn shares_to_underlying(
    user_shares: &ScaledValue,
    total_shares: &ScaledValue,
    total_underlying: &ScaledValue,
) -> MirrorResult<ScaledValue> {
    if user_shares.scale() != total_shares.scale() {
        return Err(MirrorError::ScaleMismatch {
            left: user_shares.scale().decimals(),
            right: total_shares.scale().decimals(),
        });
    }

    if total_shares.is_zero() {
        return Ok(ScaledValue::zero(total_underlying.scale()));
    }

    user_shares.mul_div(total_underlying, total_shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scale;
    use primitive_types::U256;
    use proptest::prelude::*;

    const WAD: u128 = 1_000_000_000_000_000_000;

    fn wad(raw: u128) -> ScaledValue {
        ScaledValue::from_raw_u128(raw, Scale::WAD)
    }

    #[test]
    fn test_quarter_of_pool() {
        let underlying = shares_to_underlying(&wad(250 * WAD), &wad(1000 * WAD), &wad(2000 * WAD)).unwrap();
        assert_eq!(underlying, wad(500 * WAD));
    }

    #[test]
    fn test_no_shares_minted() {
        let underlying = shares_to_underlying(&wad(250 * WAD), &wad(0), &wad(2000 * WAD)).unwrap();
        assert!(underlying.is_zero());
        assert_eq!(underlying.scale(), Scale::WAD);
    }

    #[test]
    fn test_truncates_dust() {
        // 1 share of 3 over 2 underlying = 0.66 -> 0
        let underlying = shares_to_underlying(&wad(1), &wad(3), &wad(2)).unwrap();
        assert!(underlying.is_zero());
    }

    #[test]
    fn test_result_in_underlying_scale() {
        let six = Scale::new(6).unwrap();
        let total_underlying = ScaledValue::from_raw_u128(2_000_000_000, six);
        let underlying = shares_to_underlying(&wad(WAD), &wad(4 * WAD), &total_underlying).unwrap();
        assert_eq!(underlying, ScaledValue::from_raw_u128(500_000_000, six));
    }

    #[test]
    fn test_share_scale_mismatch() {
        let six = Scale::new(6).unwrap();
        let result = shares_to_underlying(&ScaledValue::from_raw_u128(1, six), &wad(1), &wad(1));
        assert_eq!(result, Err(MirrorError::ScaleMismatch { left: 6, right: 18 }));
    }

    proptest! {
        #[test]
        fn prop_zero_total_shares_yields_zero(user in any::<u128>(), total in any::<u128>()) {
            let underlying = shares_to_underlying(&wad(user), &wad(0), &wad(total)).unwrap();
            prop_assert!(underlying.is_zero());
        }

        #[test]
        fn prop_monotonic_in_user_shares(
            a in any::<u128>(),
            b in any::<u128>(),
            total_shares in 1u128..,
            total_underlying in any::<u128>(),
        ) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let low_out = shares_to_underlying(&wad(low), &wad(total_shares), &wad(total_underlying)).unwrap();
            let high_out = shares_to_underlying(&wad(high), &wad(total_shares), &wad(total_underlying)).unwrap();
            prop_assert!(low_out.raw() <= high_out.raw());
            prop_assert!(high_out.raw() >= U256::zero());
        }
    }
}
