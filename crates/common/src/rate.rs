//! Rate Projection
//!
//! Annualizes the interest-rate model's per-second borrow rate. APR and
//! APY are informational only (nothing is gated on them), so they are the
//! one place where floating point is allowed.

use serde::{Deserialize, Serialize};

use crate::constants::time::SECONDS_PER_YEAR;
use crate::errors::{MirrorError, MirrorResult};
use crate::types::{ScaledValue, InterestSample};

/// Annualized view of a per-second borrow rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateProjection {
    /// Rate per second as sampled (WAD)
    pub rate_per_second: ScaledValue,
    /// Simple annualization, as a fraction (0.05 == 5%)
    pub apr: f64,
    /// Per-second compounding over a year, as a fraction
    pub apy: f64,
}

impl RateProjection {
    pub fn apr_percent(&self) -> f64 {
        self.apr * 100.0
    }

    pub fn apy_percent(&self) -> f64 {
        self.apy * 100.0
    }
}

/// `apr = r * SECONDS_PER_YEAR`, `apy = (1 + r)^SECONDS_PER_YEAR - 1`
pub fn annualize(rate_per_second: &ScaledValue) -> RateProjection {
    if rate_per_second.is_zero() {
        return RateProjection { rate_per_second: *rate_per_second, apr: 0.0, apy: 0.0 };
    }

    let rate = rate_per_second.to_f64_lossy();
    let periods = SECONDS_PER_YEAR as f64;

    RateProjection {
        rate_per_second: *rate_per_second,
        apr: rate * periods,
        // ln_1p / exp_m1 keep precision for tiny per-second rates
        apy: (periods * rate.ln_1p()).exp_m1(),
    }
}

/// Annualize an interest-model sample
pub fn project_sample(sample: &InterestSample) -> RateProjection {
    annualize(&sample.rate_per_second)
}

/// Exact simple APR in the rate's own scale
pub fn apr_exact(rate_per_second: &ScaledValue) -> MirrorResult<ScaledValue> {
    let raw = rate_per_second
        .raw()
        .checked_mul(SECONDS_PER_YEAR.into())
        .ok_or(MirrorError::Overflow)?;
    Ok(ScaledValue::new(raw, rate_per_second.scale()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scale;

    fn wad(raw: u128) -> ScaledValue {
        ScaledValue::from_raw_u128(raw, Scale::WAD)
    }

    #[test]
    fn test_zero_rate() {
        let projection = annualize(&wad(0));
        assert_eq!(projection.apr, 0.0);
        assert_eq!(projection.apy, 0.0);
    }

    #[test]
    fn test_one_per_billion_per_second() {
        // 1e-9 per second
        let projection = annualize(&wad(1_000_000_000));
        assert!((projection.apr - 0.031_536).abs() < 1e-12);

        // per-second compounding sits within N * r^2 / 2 of e^(N * r) - 1
        let reference = (SECONDS_PER_YEAR as f64 * 1e-9).exp_m1();
        assert!((projection.apy - reference).abs() < 1e-10);
        assert!((projection.apy - 0.032_038_6).abs() < 1e-6);
        assert!(projection.apy > projection.apr);
    }

    #[test]
    fn test_percent_views() {
        let projection = annualize(&wad(1_000_000_000));
        assert!((projection.apr_percent() - 3.1536).abs() < 1e-9);
        assert!(projection.apy_percent() > 3.1536);
    }

    #[test]
    fn test_apr_exact() {
        let apr = apr_exact(&wad(1_000_000_000)).unwrap();
        assert_eq!(apr, wad(31_536_000_000_000_000));
        assert_eq!(crate::units::format_units(&apr), "0.031536");
    }

    #[test]
    fn test_project_sample() {
        let sample = InterestSample { rate_per_second: wad(0) };
        assert_eq!(project_sample(&sample).apy, 0.0);
    }
}
