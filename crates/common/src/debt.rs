//! Debt Accrual
//!
//! A borrower's debt grows with the ratio of the pool's current borrow
//! index to the index recorded at their last interaction.
//!
//! ```text
//! debt = principal * global_index / user_index
//! ```
//!
//! The global index only ever grows on the ledger. The tracker does not
//! enforce that; [`observe_index`] reports a regression so the snapshot
//! can be flagged instead of showing debt that shrank.

use core::cmp::Ordering;

use crate::errors::{MirrorError, MirrorResult};
use crate::types::ScaledValue;

/// Current owed debt for a position
///
/// - zero principal owes nothing, whatever the indices say
/// - a zero user index was never recorded and reads as the global index
pub fn current_debt(
    principal: &ScaledValue,
    user_index: &ScaledValue,
    global_index: &ScaledValue,
) -> MirrorResult<ScaledValue> {
    if principal.is_zero() {
        return Ok(ScaledValue::zero(principal.scale()));
    }

    if user_index.scale() != global_index.scale() {
        return Err(MirrorError::ScaleMismatch {
            left: user_index.scale().decimals(),
            right: global_index.scale().decimals(),
        });
    }

    let user_index = if user_index.is_zero() { global_index } else { user_index };

    principal.mul_div(global_index, user_index)
}

/// How a freshly read global index relates to the last one seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexObservation {
    /// Nothing seen before for this session
    First,
    /// Index grew
    Advanced,
    /// Same value as before
    Unchanged,
    /// Index went backwards: the ledger data is inconsistent
    Regressed {
        previous: ScaledValue,
        observed: ScaledValue,
    },
}

impl IndexObservation {
    pub fn is_regression(&self) -> bool {
        matches!(self, Self::Regressed { .. })
    }
}

/// Compare the observed global index against the previous one
pub fn observe_index(
    previous: Option<&ScaledValue>,
    observed: &ScaledValue,
) -> MirrorResult<IndexObservation> {
    let Some(previous) = previous else {
        return Ok(IndexObservation::First);
    };

    Ok(match observed.checked_cmp(previous)? {
        Ordering::Greater => IndexObservation::Advanced,
        Ordering::Equal => IndexObservation::Unchanged,
        Ordering::Less => IndexObservation::Regressed {
            previous: *previous,
            observed: *observed,
        },
    })
}

/// True when a recorded user index is above the global index, which
/// would make the debt smaller than the principal
pub fn user_index_ahead(user_index: &ScaledValue, global_index: &ScaledValue) -> MirrorResult<bool> {
    if user_index.is_zero() {
        return Ok(false);
    }
    Ok(user_index.checked_cmp(global_index)? == Ordering::Greater)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scale;
    use proptest::prelude::*;

    const WAD: u128 = 1_000_000_000_000_000_000;

    fn wad(raw: u128) -> ScaledValue {
        ScaledValue::from_raw_u128(raw, Scale::WAD)
    }

    fn usdc(raw: u128) -> ScaledValue {
        ScaledValue::from_raw_u128(raw, Scale::new(6).unwrap())
    }

    #[test]
    fn test_debt_grows_with_index() {
        // 100 USDC at index 1.00, global now 1.10 -> 110 USDC
        let debt = current_debt(&usdc(100_000_000), &wad(WAD), &wad(11 * WAD / 10)).unwrap();
        assert_eq!(debt, usdc(110_000_000));
    }

    #[test]
    fn test_zero_principal() {
        let debt = current_debt(&usdc(0), &wad(0), &wad(0)).unwrap();
        assert_eq!(debt, usdc(0));
    }

    #[test]
    fn test_zero_user_index_means_no_accrual() {
        let debt = current_debt(&usdc(100_000_000), &wad(0), &wad(11 * WAD / 10)).unwrap();
        assert_eq!(debt, usdc(100_000_000));
    }

    #[test]
    fn test_zero_indices_with_principal_is_malformed() {
        let result = current_debt(&usdc(1), &wad(0), &wad(0));
        assert_eq!(result, Err(MirrorError::DivisionByZero));
    }

    #[test]
    fn test_debt_truncates() {
        // 1 unit * 1.5 / 1.0 = 1.5 -> 1
        let debt = current_debt(&usdc(1), &wad(WAD), &wad(3 * WAD / 2)).unwrap();
        assert_eq!(debt, usdc(1));
    }

    #[test]
    fn test_observe_index() {
        assert_eq!(observe_index(None, &wad(WAD)).unwrap(), IndexObservation::First);
        assert_eq!(observe_index(Some(&wad(WAD)), &wad(WAD + 1)).unwrap(), IndexObservation::Advanced);
        assert_eq!(observe_index(Some(&wad(WAD)), &wad(WAD)).unwrap(), IndexObservation::Unchanged);
        let regressed = observe_index(Some(&wad(WAD + 1)), &wad(WAD)).unwrap();
        assert!(regressed.is_regression());
    }

    #[test]
    fn test_user_index_ahead() {
        assert!(user_index_ahead(&wad(2 * WAD), &wad(WAD)).unwrap());
        assert!(!user_index_ahead(&wad(WAD), &wad(WAD)).unwrap());
        assert!(!user_index_ahead(&wad(0), &wad(WAD)).unwrap());
    }

    proptest! {
        #[test]
        fn prop_zero_principal_owes_nothing(user in any::<u128>(), global in any::<u128>()) {
            let debt = current_debt(&usdc(0), &wad(user), &wad(global)).unwrap();
            prop_assert!(debt.is_zero());
        }

        #[test]
        fn prop_zero_index_sentinel_equivalence(principal in any::<u128>(), global in 1u128..) {
            let with_sentinel = current_debt(&usdc(principal), &wad(0), &wad(global)).unwrap();
            let with_global = current_debt(&usdc(principal), &wad(global), &wad(global)).unwrap();
            prop_assert_eq!(with_sentinel, with_global);
        }
    }
}
