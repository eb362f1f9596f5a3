//! Sale periods (tranches) and their ordered registry

use serde::{Deserialize, Serialize};

use crate::error::{AdminError, AdminResult, RegistryError};
use crate::{Amount, PeriodIndex, Timestamp};

/// A time- and supply-bounded sale window with its own base price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Period {
    /// Exclusive upper bound of the sale window
    pub end_time: Timestamp,
    /// Cap on units sold within this period
    pub max_supply: u64,
    /// Base price in the smallest unit of the payment asset
    pub price: Amount,
    /// Units already sold in this period
    pub minted_count: u64,
}

impl Period {
    pub fn new(end_time: Timestamp, max_supply: u64, price: Amount) -> Self {
        Self {
            end_time,
            max_supply,
            price,
            minted_count: 0,
        }
    }

    /// Zero-supply periods are always exhausted
    pub fn is_exhausted(&self) -> bool {
        self.minted_count >= self.max_supply
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.end_time <= now
    }

    /// Can sell at `now`
    pub fn is_open(&self, now: Timestamp) -> bool {
        !self.is_expired(now) && !self.is_exhausted()
    }

    pub fn remaining(&self) -> u64 {
        self.max_supply.saturating_sub(self.minted_count)
    }
}

/// Parameters for a period that has not been added yet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodParams {
    pub end_time: Timestamp,
    pub max_supply: u64,
    pub price: Amount,
}

impl PeriodParams {
    pub fn new(end_time: Timestamp, max_supply: u64, price: Amount) -> Self {
        Self {
            end_time,
            max_supply,
            price,
        }
    }
}

/// Append-only ordered sequence of periods.
///
/// Insertion order is the only ordering; periods are never removed and only
/// `minted_count` is mutated after insertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PeriodRegistry {
    periods: Vec<Period>,
}

impl PeriodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the initial sequence. Placeholders may appear anywhere in the
    /// set as long as one period is sellable.
    pub fn from_initial(initial: &[PeriodParams], now: Timestamp) -> AdminResult<Self> {
        let mut registry = Self::new();
        for params in initial {
            if params.end_time <= now {
                return Err(AdminError::InvalidPeriod(format!(
                    "end time {} is not after {}",
                    params.end_time, now
                )));
            }
            registry
                .periods
                .push(Period::new(params.end_time, params.max_supply, params.price));
        }

        if !registry.has_sellable() {
            return Err(AdminError::InvalidPeriod(
                "initial periods contain no sellable supply".to_string(),
            ));
        }

        Ok(registry)
    }

    /// Check the parameters of a period about to be appended at `now`
    pub fn validate_new(
        &self,
        end_time: Timestamp,
        max_supply: u64,
        now: Timestamp,
    ) -> AdminResult<()> {
        if end_time <= now {
            return Err(AdminError::InvalidPeriod(format!(
                "end time {} is not after {}",
                end_time, now
            )));
        }

        // A zero-supply period is only a placeholder; it can never be the
        // only thing on sale.
        if max_supply == 0 && !self.has_sellable() {
            return Err(AdminError::InvalidPeriod(
                "zero-supply period requires an existing sellable period".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate and append a fresh period, returning its index
    pub fn add_period(
        &mut self,
        end_time: Timestamp,
        max_supply: u64,
        price: Amount,
        now: Timestamp,
    ) -> AdminResult<PeriodIndex> {
        self.validate_new(end_time, max_supply, now)?;
        self.periods.push(Period::new(end_time, max_supply, price));
        Ok(self.periods.len() - 1)
    }

    /// Increment the sold counter of one period
    pub fn record_sale(&mut self, index: PeriodIndex) -> Result<(), RegistryError> {
        let period = self
            .periods
            .get_mut(index)
            .ok_or(RegistryError::UnknownPeriod(index))?;

        if period.is_exhausted() {
            return Err(RegistryError::CapacityExceeded {
                index,
                max_supply: period.max_supply,
            });
        }

        period.minted_count += 1;
        Ok(())
    }

    pub fn get(&self, index: PeriodIndex) -> Option<&Period> {
        self.periods.get(index)
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Any period with a non-zero cap
    pub fn has_sellable(&self) -> bool {
        self.periods.iter().any(|p| p.max_supply > 0)
    }

    /// Sum of per-period counters, widened so it cannot wrap
    pub fn total_minted(&self) -> u128 {
        self.periods.iter().map(|p| p.minted_count as u128).sum()
    }

    /// Unsold supply in `start..` that has not expired at `now`, capped at
    /// `u64::MAX`
    pub fn remaining_from(&self, start: PeriodIndex, now: Timestamp) -> u64 {
        self.periods
            .iter()
            .skip(start)
            .filter(|p| !p.is_expired(now))
            .fold(0u64, |total, p| total.saturating_add(p.remaining()))
    }
}

impl From<Vec<Period>> for PeriodRegistry {
    fn from(periods: Vec<Period>) -> Self {
        Self { periods }
    }
}
