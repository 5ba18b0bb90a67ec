//! position snapshot
//!
//! one consistent view of an account, computed from a single batch of
//! ledger reads. a stage that hits a math error reports zero for its
//! figure and flags the snapshot instead of failing it.

use lendmirror_common::{
    annualize, assess, check_borrow, current_debt, observe_index, preview_withdraw, shares_to_underlying,
    user_index_ahead, value_in_usd, Address, BorrowPreview, IndexObservation, MirrorError, MirrorResult,
    PoolState, RateProjection, RiskView, Scale, ScaledValue, UserPosition, WithdrawPreview,
};
use borsh::BorshSerialize;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{MonitorError, MonitorResult};
use crate::ledger::LedgerReads;

/// the account and chain a snapshot belongs to
///
/// `epoch` grows on every switch, so switching away and back still
/// invalidates refreshes started before.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize)]
pub struct Session {
    pub account: Address,
    pub chain_id: u64,
    pub epoch: u64,
}

impl Session {
    pub fn new(account: Address, chain_id: u64) -> Self {
        Self { account, chain_id, epoch: 0 }
    }

    pub fn next(&self, account: Address, chain_id: u64) -> Self {
        Self { account, chain_id, epoch: self.epoch + 1 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Collateral,
    Debt,
    DebtValue,
    Risk,
}

/// why a snapshot must not be used for decisions
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityFlag {
    /// global borrow index went below the previously published one
    IndexRegressed { previous: ScaledValue, observed: ScaledValue },
    /// recorded user index is above the global index
    UserIndexAhead { user_index: ScaledValue, global_index: ScaledValue },
    /// a stage failed on malformed inputs
    Math { stage: Stage, code: &'static str, message: String },
}

impl IntegrityFlag {
    fn math(stage: Stage, error: &MirrorError) -> Self {
        Self::Math { stage, code: error.code(), message: error.to_string() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PositionSnapshot {
    pub sequence: u64,
    pub session: Session,
    pub block_number: u64,
    /// unix seconds
    pub taken_at: u64,
    pub pool: PoolState,
    pub position: UserPosition,
    pub collateral_price: ScaledValue,
    pub borrow_price: ScaledValue,
    pub min_borrow: ScaledValue,
    /// collateral shares in underlying units
    pub collateral_underlying: ScaledValue,
    /// accrued debt in borrow units
    pub current_debt: ScaledValue,
    pub rates: RateProjection,
    pub risk: RiskView,
    pub integrity: Vec<IntegrityFlag>,
}

impl PositionSnapshot {
    /// compute every derived figure from one batch
    ///
    /// `previous` is the snapshot currently published for the same
    /// session, used to detect a regressing borrow index.
    pub fn build(
        sequence: u64,
        session: Session,
        taken_at: u64,
        reads: LedgerReads,
        previous: Option<&PositionSnapshot>,
    ) -> Self {
        let LedgerReads { block_number, pool, position, sample, collateral_price, borrow_price, min_borrow } = reads;
        let mut integrity = Vec::new();

        let previous_index = previous.filter(|p| p.session == session).map(|p| &p.pool.borrow_index);
        match observe_index(previous_index, &pool.borrow_index) {
            Ok(IndexObservation::Regressed { previous, observed }) => {
                integrity.push(IntegrityFlag::IndexRegressed { previous, observed });
            }
            Ok(_) => {}
            Err(e) => integrity.push(IntegrityFlag::math(Stage::Debt, &e)),
        }

        if !position.principal_borrow.is_zero() {
            match user_index_ahead(&position.user_borrow_index, &pool.borrow_index) {
                Ok(true) => integrity.push(IntegrityFlag::UserIndexAhead {
                    user_index: position.user_borrow_index,
                    global_index: pool.borrow_index,
                }),
                Ok(false) => {}
                Err(e) => integrity.push(IntegrityFlag::math(Stage::Debt, &e)),
            }
        }

        let collateral_underlying = staged(
            &mut integrity,
            Stage::Collateral,
            shares_to_underlying(&position.share_balance, &pool.total_collateral_shares, &pool.total_collateral_underlying),
            pool.total_collateral_underlying.scale(),
        );

        let current_debt = staged(
            &mut integrity,
            Stage::Debt,
            current_debt(&position.principal_borrow, &position.user_borrow_index, &pool.borrow_index),
            position.principal_borrow.scale(),
        );

        let math_failed = integrity.iter().any(|f| matches!(f, IntegrityFlag::Math { .. }));

        let risk = if math_failed || (borrow_price.is_zero() && !current_debt.is_zero()) {
            // figures are zeroed or unpriced; no ratio would be meaningful
            RiskView::unknown()
        } else {
            match value_in_usd(&current_debt, &borrow_price) {
                Err(e) => {
                    integrity.push(IntegrityFlag::math(Stage::DebtValue, &e));
                    RiskView::unknown()
                }
                Ok(debt_value) => {
                    match assess(&collateral_underlying, &collateral_price, &debt_value, &pool.liquidation_threshold) {
                        Ok(view) => view,
                        Err(e) => {
                            integrity.push(IntegrityFlag::math(Stage::Risk, &e));
                            RiskView::unknown()
                        }
                    }
                }
            }
        };

        Self {
            sequence,
            session,
            block_number,
            taken_at,
            rates: annualize(&sample.rate_per_second),
            pool,
            position,
            collateral_price,
            borrow_price,
            min_borrow,
            collateral_underlying,
            current_debt,
            risk,
            integrity,
        }
    }

    pub fn account(&self) -> &Address {
        &self.session.account
    }

    /// false when any integrity flag is raised
    pub fn is_actionable(&self) -> bool {
        self.integrity.is_empty()
    }

    /// SHA-256 over everything a snapshot renders except `sequence` and
    /// `taken_at`; equal fingerprints render the same
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(borsh::to_vec(&self.session).unwrap_or_default());
        hasher.update(self.block_number.to_le_bytes());
        hasher.update(borsh::to_vec(&self.pool).unwrap_or_default());
        hasher.update(borsh::to_vec(&self.position).unwrap_or_default());
        hasher.update(borsh::to_vec(&self.collateral_price).unwrap_or_default());
        hasher.update(borsh::to_vec(&self.borrow_price).unwrap_or_default());
        hasher.update(borsh::to_vec(&self.min_borrow).unwrap_or_default());
        hasher.update(borsh::to_vec(&self.collateral_underlying).unwrap_or_default());
        hasher.update(borsh::to_vec(&self.current_debt).unwrap_or_default());
        // apr and apy are pure functions of the sampled rate
        hasher.update(borsh::to_vec(&self.rates.rate_per_second).unwrap_or_default());
        hasher.update(borsh::to_vec(&self.risk).unwrap_or_default());
        hasher.update(serde_json::to_vec(&self.integrity).unwrap_or_default());
        hasher.finalize().into()
    }

    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint())
    }

    /// check a borrow of `amount` borrow tokens against this snapshot
    pub fn preview_borrow(&self, amount: &ScaledValue) -> MonitorResult<BorrowPreview> {
        self.ensure_actionable()?;
        Ok(check_borrow(amount, &self.borrow_price, &self.min_borrow, &self.risk)?)
    }

    /// underlying released by burning `shares`
    pub fn preview_withdraw(&self, shares: &ScaledValue) -> MonitorResult<WithdrawPreview> {
        self.ensure_actionable()?;
        Ok(preview_withdraw(
            shares,
            &self.position.share_balance,
            &self.pool.total_collateral_shares,
            &self.pool.total_collateral_underlying,
        )?)
    }

    fn ensure_actionable(&self) -> MonitorResult<()> {
        if !self.is_actionable() {
            return Err(MonitorError::Inconsistent { sequence: self.sequence });
        }
        Ok(())
    }
}

fn staged(integrity: &mut Vec<IntegrityFlag>, stage: Stage, result: MirrorResult<ScaledValue>, scale: Scale) -> ScaledValue {
    result.unwrap_or_else(|e| {
        integrity.push(IntegrityFlag::math(stage, &e));
        ScaledValue::zero(scale)
    })
}
