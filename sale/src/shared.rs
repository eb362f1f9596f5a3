//! Shared sale engine for concurrent callers
//!
//! All mutating operations hold the write lock for their whole duration, so
//! no caller can observe a half-committed sale and two buyers can never both
//! pass the capacity check for the last unit of a period.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::{Sale, SaleEngine, SaleQuote, SaleState, SaleStats};
use crate::error::{AdminResult, Result};
use crate::period::{Period, PeriodParams};
use crate::{PeriodIndex, Timestamp};

#[derive(Clone)]
pub struct SharedSaleEngine {
    inner: Arc<RwLock<SaleEngine>>,
}

impl SharedSaleEngine {
    pub fn new(engine: SaleEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub async fn sell(&self, caller: &str, now: Timestamp) -> Result<Sale> {
        self.inner.write().await.sell(caller, now)
    }

    pub async fn add_period(
        &self,
        caller: &str,
        now: Timestamp,
        params: PeriodParams,
    ) -> AdminResult<PeriodIndex> {
        self.inner.write().await.add_period(caller, now, params)
    }

    pub async fn change_rebate_config(
        &self,
        caller: &str,
        max_rebate: u8,
        curve_steepness: u64,
    ) -> AdminResult<()> {
        self.inner
            .write()
            .await
            .change_rebate_config(caller, max_rebate, curve_steepness)
    }

    pub async fn refresh(&self, now: Timestamp) -> PeriodIndex {
        self.inner.write().await.refresh(now)
    }

    pub async fn quote(&self, now: Timestamp) -> Result<SaleQuote> {
        self.inner.read().await.quote(now)
    }

    pub async fn periods(&self) -> Vec<Period> {
        self.inner.read().await.periods().to_vec()
    }

    pub async fn current_period(&self, now: Timestamp) -> Option<(PeriodIndex, Period)> {
        self.inner.read().await.current_period(now)
    }

    pub async fn state(&self) -> SaleState {
        self.inner.read().await.state()
    }

    pub async fn stats(&self, now: Timestamp) -> SaleStats {
        self.inner.read().await.stats(now)
    }

    /// Take the engine back once every clone has been dropped
    pub fn into_inner(self) -> std::result::Result<SaleEngine, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}
