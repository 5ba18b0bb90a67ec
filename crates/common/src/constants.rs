//! Engine Constants
//!
//! Scales, time constants and risk thresholds. The thresholds are fixed
//! policy and deliberately not part of the runtime configuration.

/// Decimal scales (number of fractional digits)
pub mod scale {
    /// WAD: 1.0 == 10^18
    pub const WAD_DECIMALS: u8 = 18;

    /// Oracle prices are USD per whole token, scaled by 10^18
    pub const PRICE_DECIMALS: u8 = 18;

    /// USD values are WAD-scaled
    pub const USD_DECIMALS: u8 = 18;

    /// Health factor scale (see DESIGN.md, "HF-scale")
    pub const HF_DECIMALS: u8 = 18;

    /// Scale of the factor reported by the pool's `getUserAccountData`
    /// (collateral USD-WAD times threshold WAD over 6-decimal debt)
    pub const LEDGER_HF_DECIMALS: u8 = 30;

    /// Largest scale whose unit (10^77) still fits in a U256
    pub const MAX_DECIMALS: u8 = 77;
}

/// Time-related constants
pub mod time {
    /// 365 * 24 * 60 * 60
    pub const SECONDS_PER_YEAR: u64 = 31_536_000;
}

/// Risk tier boundaries, in HF-scale raw units
pub mod risk {
    /// Below this the position can be liquidated (1.0)
    pub const LIQUIDATION_HF_RAW: u128 = 1_000_000_000_000_000_000;

    /// Below this (and at or above 1.0) the position is in Warning (1.2)
    pub const WARNING_HF_RAW: u128 = 1_200_000_000_000_000_000;
}

/// Defaults for the asset layout of the mirrored pool
pub mod assets {
    /// Collateral token decimals (DAI)
    pub const COLLATERAL_DECIMALS: u8 = 18;

    /// Collateral share token decimals
    pub const SHARE_DECIMALS: u8 = 18;

    /// Borrow token decimals (USDC)
    pub const BORROW_DECIMALS: u8 = 6;
}
