//! lendmirror Common Library
//!
//! Read-only mirror of a lending pool's accounting math.
//!
//! Given raw state read from the ledger (pool totals, a user's share
//! balance, the borrow index, a rate sample, an oracle price), this crate
//! reproduces the figures the pool contract itself would compute, using
//! the same integer semantics:
//!
//! - **Fixed point**: every amount is a [`ScaledValue`] that carries its
//!   decimal scale; `mul_div` widens to 512 bits and truncates like the
//!   ledger's integer division
//! - **Shares**: collateral-share balance to underlying collateral
//! - **Debt**: principal and index snapshot to current owed debt
//! - **Rates**: per-second borrow rate to APR / APY (display only)
//! - **Risk**: collateral value, debt value, health factor and tier
//! - **Previews**: borrow capacity checks and withdraw previews
//!
//! Nothing in this crate holds mutable state. Every component is a pure
//! function of its inputs, so a failure never leaves anything half-done.

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod units;
pub mod shares;
pub mod debt;
pub mod rate;
pub mod risk;
pub mod preview;
pub mod events;


// Re-exports for convenience
pub use errors::*;
pub use types::*;
pub use math::*;
pub use units::{format_units, parse_units};
pub use shares::*;
pub use debt::*;
pub use rate::*;
pub use risk::*;
pub use preview::*;
pub use events::*;

pub use primitive_types::{U256, U512};
