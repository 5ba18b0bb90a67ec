//! in-memory ledger replaying a fixed set of raw values
//!
//! used by the `lendmirror` binary to replay a JSON fixture and by the
//! tests as a ledger with programmable failures and latency.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lendmirror_common::{Address, AssetDecimals, InterestSample, PoolState, ScaledValue, UserPosition};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{MonitorError, MonitorResult, ReadError};
use crate::ledger::LedgerReader;

/// raw ledger values, as a fixture file holds them
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureState {
    pub block_number: u64,
    pub pool: PoolState,
    #[serde(default)]
    pub positions: BTreeMap<Address, UserPosition>,
    /// interest-rate model output; the fixture samples a fixed value
    pub rate_per_second: ScaledValue,
    pub collateral_price: ScaledValue,
    pub borrow_price: ScaledValue,
    pub min_borrow: ScaledValue,
}

pub struct FixtureLedger {
    state: RwLock<FixtureState>,
    decimals: AssetDecimals,
    failing: AtomicBool,
    delay_ms: AtomicU64,
    batches: AtomicUsize,
}

impl FixtureLedger {
    pub fn new(state: FixtureState, decimals: AssetDecimals) -> Self {
        Self {
            state: RwLock::new(state),
            decimals,
            failing: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
            batches: AtomicUsize::new(0),
        }
    }

    pub fn from_json(text: &str, decimals: AssetDecimals) -> MonitorResult<Self> {
        let state: FixtureState = serde_json::from_str(text).map_err(|e| MonitorError::Fixture(e.to_string()))?;
        Ok(Self::new(state, decimals))
    }

    pub fn load(path: &Path, decimals: AssetDecimals) -> MonitorResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text, decimals)
    }

    /// mutate the raw values, as a ledger transaction would
    pub async fn update<F: FnOnce(&mut FixtureState)>(&self, f: F) {
        let mut state = self.state.write().await;
        f(&mut state);
    }

    /// make every read fail until cleared
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// latency added to the pool read of every batch
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// number of pool reads served, one per batch
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    fn check(&self, call: &'static str) -> Result<(), ReadError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ReadError::Call { call, reason: "fixture set to fail".into() });
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerReader for FixtureLedger {
    async fn pool_state(&self) -> Result<PoolState, ReadError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.check("pool_state")?;
        Ok(self.state.read().await.pool.clone())
    }

    async fn user_position(&self, account: &Address) -> Result<UserPosition, ReadError> {
        self.check("user_position")?;
        let state = self.state.read().await;
        Ok(state
            .positions
            .get(account)
            .cloned()
            .unwrap_or_else(|| UserPosition::empty(&self.decimals)))
    }

    async fn borrow_rate_per_second(
        &self,
        _cash: &ScaledValue,
        _total_borrows: &ScaledValue,
    ) -> Result<InterestSample, ReadError> {
        self.check("borrow_rate_per_second")?;
        Ok(InterestSample { rate_per_second: self.state.read().await.rate_per_second })
    }

    async fn collateral_price(&self) -> Result<ScaledValue, ReadError> {
        self.check("collateral_price")?;
        Ok(self.state.read().await.collateral_price)
    }

    async fn borrow_asset_price(&self) -> Result<ScaledValue, ReadError> {
        self.check("borrow_asset_price")?;
        Ok(self.state.read().await.borrow_price)
    }

    async fn min_borrow(&self) -> Result<ScaledValue, ReadError> {
        self.check("min_borrow")?;
        Ok(self.state.read().await.min_borrow)
    }

    async fn block_number(&self) -> Result<u64, ReadError> {
        self.check("block_number")?;
        Ok(self.state.read().await.block_number)
    }
}

/// 2000 DAI pool with one borrower: 250 of 1000 shares, 100 USDC
/// borrowed at index 1.00, pool index now 1.10
#[cfg(test)]
pub(crate) fn sample_state(account: Address) -> FixtureState {
    use lendmirror_common::Scale;

    const WAD: u128 = 1_000_000_000_000_000_000;
    let wad = |raw: u128| ScaledValue::from_raw_u128(raw, Scale::WAD);
    let usdc = |raw: u128| ScaledValue::from_raw_u128(raw, Scale::new(6).unwrap());

    let mut positions = BTreeMap::new();
    positions.insert(
        account,
        UserPosition {
            share_balance: wad(250 * WAD),
            principal_borrow: usdc(100_000_000),
            user_borrow_index: wad(WAD),
        },
    );

    FixtureState {
        block_number: 100,
        pool: PoolState {
            total_collateral_underlying: wad(2000 * WAD),
            total_collateral_shares: wad(1000 * WAD),
            total_borrows: usdc(5_000_000_000),
            borrow_index: wad(11 * WAD / 10),
            cash: usdc(15_000_000_000),
            liquidation_threshold: wad(8 * WAD / 10),
        },
        positions,
        rate_per_second: wad(1_585_489_599),
        collateral_price: wad(WAD),
        borrow_price: wad(WAD),
        min_borrow: usdc(1_000_000),
    }
}
