//! ledger collaborator interface
//!
//! every call is a side-effect-free read. a refresh issues the
//! independent reads concurrently and joins them before computing
//! anything; the rate model needs the pool's cash and borrows, so it is
//! read right after.

use async_trait::async_trait;
use lendmirror_common::{Address, AssetDecimals, InterestSample, PoolState, Scale, ScaledValue, UserPosition};

use crate::error::ReadError;

#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn pool_state(&self) -> Result<PoolState, ReadError>;

    async fn user_position(&self, account: &Address) -> Result<UserPosition, ReadError>;

    /// interest-rate model output for the given utilization inputs
    async fn borrow_rate_per_second(
        &self,
        cash: &ScaledValue,
        total_borrows: &ScaledValue,
    ) -> Result<InterestSample, ReadError>;

    /// USD per whole collateral token, at price scale
    async fn collateral_price(&self) -> Result<ScaledValue, ReadError>;

    /// USD per whole borrow token, at price scale
    async fn borrow_asset_price(&self) -> Result<ScaledValue, ReadError>;

    /// smallest borrow the pool accepts, in borrow-token units
    async fn min_borrow(&self) -> Result<ScaledValue, ReadError>;

    async fn block_number(&self) -> Result<u64, ReadError>;
}

/// one point-in-time batch of reads
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerReads {
    pub block_number: u64,
    pub pool: PoolState,
    pub position: UserPosition,
    pub sample: InterestSample,
    pub collateral_price: ScaledValue,
    pub borrow_price: ScaledValue,
    pub min_borrow: ScaledValue,
}

/// read everything a snapshot needs; any failure fails the whole batch
pub async fn read_batch<L>(ledger: &L, account: &Address) -> Result<LedgerReads, ReadError>
where
    L: LedgerReader + ?Sized,
{
    let (block_number, pool, position, collateral_price, borrow_price, min_borrow) = futures::try_join!(
        ledger.block_number(),
        ledger.pool_state(),
        ledger.user_position(account),
        ledger.collateral_price(),
        ledger.borrow_asset_price(),
        ledger.min_borrow(),
    )?;

    let sample = ledger.borrow_rate_per_second(&pool.cash, &pool.total_borrows).await?;

    Ok(LedgerReads {
        block_number,
        pool,
        position,
        sample,
        collateral_price,
        borrow_price,
        min_borrow,
    })
}

fn expect_scale(field: &'static str, value: &ScaledValue, scale: Scale) -> Result<(), ReadError> {
    if value.scale() != scale {
        return Err(ReadError::Malformed {
            field,
            reason: format!("expected {} decimals, got {}", scale.decimals(), value.scale().decimals()),
        });
    }
    Ok(())
}

impl LedgerReads {
    /// reject values that do not come in the pool's configured decimals
    pub fn check_layout(&self, decimals: &AssetDecimals) -> Result<(), ReadError> {
        expect_scale("total_collateral_underlying", &self.pool.total_collateral_underlying, decimals.collateral)?;
        expect_scale("total_collateral_shares", &self.pool.total_collateral_shares, decimals.shares)?;
        expect_scale("total_borrows", &self.pool.total_borrows, decimals.borrow)?;
        expect_scale("cash", &self.pool.cash, decimals.borrow)?;
        expect_scale("borrow_index", &self.pool.borrow_index, Scale::WAD)?;
        expect_scale("liquidation_threshold", &self.pool.liquidation_threshold, Scale::WAD)?;
        expect_scale("share_balance", &self.position.share_balance, decimals.shares)?;
        expect_scale("principal_borrow", &self.position.principal_borrow, decimals.borrow)?;
        expect_scale("user_borrow_index", &self.position.user_borrow_index, Scale::WAD)?;
        expect_scale("rate_per_second", &self.sample.rate_per_second, Scale::WAD)?;
        expect_scale("collateral_price", &self.collateral_price, Scale::PRICE)?;
        expect_scale("borrow_price", &self.borrow_price, Scale::PRICE)?;
        expect_scale("min_borrow", &self.min_borrow, decimals.borrow)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{sample_state, FixtureLedger};

    fn account() -> Address {
        Address([0xaa; 20])
    }

    #[tokio::test]
    async fn test_read_batch_joins_all_reads() {
        let ledger = FixtureLedger::new(sample_state(account()), AssetDecimals::default());
        let reads = read_batch(&ledger, &account()).await.unwrap();

        assert_eq!(reads.block_number, 100);
        assert_eq!(reads.position.share_balance.to_string(), "250.0");
        assert!(reads.check_layout(&AssetDecimals::default()).is_ok());
        assert_eq!(ledger.batches(), 1);
    }

    #[tokio::test]
    async fn test_read_batch_fails_as_a_whole() {
        let ledger = FixtureLedger::new(sample_state(account()), AssetDecimals::default());
        ledger.set_failing(true);
        let err = read_batch(&ledger, &account()).await.unwrap_err();
        assert_eq!(err.code(), "R001_CALL_FAILED");
    }

    #[tokio::test]
    async fn test_layout_mismatch_is_malformed() {
        let ledger = FixtureLedger::new(sample_state(account()), AssetDecimals::default());
        let reads = read_batch(&ledger, &account()).await.unwrap();

        let mut decimals = AssetDecimals::default();
        decimals.borrow = Scale::new(8).unwrap();
        let err = reads.check_layout(&decimals).unwrap_err();
        assert!(matches!(err, ReadError::Malformed { field: "total_borrows", .. }));
    }
}
