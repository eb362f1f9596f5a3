//! Sale coordinator
//!
//! Admission, pricing and commit of a single-unit sale:
//!
//! ```text
//!   sell(caller, now)
//!     ├─ scan periods from the committed pointer     (PeriodAdvancer)
//!     ├─ price = base - floor(base * discount(sold)) (RebateCurve)
//!     ├─ ledger.debit(caller, price)                 (nothing mutated yet)
//!     └─ commit counters + pointer, issue, notify
//! ```
//!
//! Every operation takes `&mut self` or `&self`; callers that share one
//! engine across tasks go through `SharedSaleEngine`.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use tranche_economics::{
    Discount, PriceCalculator, PriceQuote, RebateConfig, RebateCurve, SupplyCounter,
};

use crate::advancer::{Advance, PeriodAdvancer};
use crate::error::{AdminError, AdminResult, Result, SaleError, StateError};
use crate::events::SaleEvent;
use crate::period::{Period, PeriodParams, PeriodRegistry};
use crate::ports::Collaborators;
use crate::{Amount, PeriodIndex, Timestamp, UnitId};

/// Everything that must survive a restart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleState {
    pub periods: Vec<Period>,
    pub current_period: PeriodIndex,
    pub total_sold: u64,
    pub rebate: RebateConfig,
}

/// Price a sale would be charged at a given instant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleQuote {
    pub period_index: PeriodIndex,
    pub quote: PriceQuote,
}

impl SaleQuote {
    pub fn price(&self) -> Amount {
        self.quote.price
    }

    pub fn discount(&self) -> Discount {
        self.quote.discount
    }
}

/// Receipt of a committed sale
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sale {
    pub price: Amount,
    pub period_index: PeriodIndex,
    pub unit_id: UnitId,
}

/// Snapshot for dashboards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleStats {
    pub total_sold: u64,
    pub period_count: usize,
    pub current_period: Option<PeriodIndex>,
    pub remaining_supply: u64,
    pub exhausted: bool,
}

pub struct SaleEngine {
    registry: PeriodRegistry,
    advancer: PeriodAdvancer,
    supply: SupplyCounter,
    rebate: RebateCurve,
    ports: Collaborators,
}

impl SaleEngine {
    /// Start a sale with its initial periods
    pub fn new(
        initial: &[PeriodParams],
        rebate: RebateConfig,
        now: Timestamp,
        ports: Collaborators,
    ) -> AdminResult<Self> {
        rebate.validate()?;
        let registry = PeriodRegistry::from_initial(initial, now)?;

        info!(
            "🏷️  Sale started with {} periods (max rebate {}%, steepness {})",
            registry.len(),
            rebate.max_rebate,
            rebate.curve_steepness
        );

        Ok(Self {
            registry,
            advancer: PeriodAdvancer::new(),
            supply: SupplyCounter::new(),
            rebate: RebateCurve::new(rebate),
            ports,
        })
    }

    /// Resume from persisted state
    pub fn restore(state: SaleState, ports: Collaborators) -> std::result::Result<Self, StateError> {
        state.rebate.validate()?;

        for (index, period) in state.periods.iter().enumerate() {
            if period.minted_count > period.max_supply {
                return Err(StateError::OverMinted {
                    index,
                    minted: period.minted_count,
                    max_supply: period.max_supply,
                });
            }
        }

        if state.current_period > state.periods.len() {
            return Err(StateError::PointerOutOfRange {
                current: state.current_period,
                len: state.periods.len(),
            });
        }

        let registry = PeriodRegistry::from(state.periods);
        if registry.total_minted() != state.total_sold as u128 {
            return Err(StateError::CounterMismatch {
                minted: registry.total_minted(),
                total_sold: state.total_sold,
            });
        }

        info!(
            "🏷️  Sale restored: {} periods, pointer {}, {} sold",
            registry.len(),
            state.current_period,
            state.total_sold
        );

        Ok(Self {
            registry,
            advancer: PeriodAdvancer::starting_at(state.current_period),
            supply: SupplyCounter::starting_at(state.total_sold),
            rebate: RebateCurve::new(state.rebate),
            ports,
        })
    }

    /// Sell one unit to `caller` at `now`.
    ///
    /// Either the payment is taken and the sale committed, or nothing
    /// changes at all.
    pub fn sell(&mut self, caller: &str, now: Timestamp) -> Result<Sale> {
        let SaleQuote {
            period_index,
            quote,
        } = self.quote(now)?;
        debug_assert!(
            self.registry
                .get(period_index)
                .is_some_and(|period| period.is_open(now)),
            "quote returned closed period {}",
            period_index
        );

        if let Err(e) = self.ports.ledger.debit(caller, quote.price) {
            warn!(
                "Payment of {} from {} rejected in period {}: {}",
                quote.price, caller, period_index, e
            );
            return Err(e.into());
        }

        self.registry.record_sale(period_index)?;
        self.supply.record_sale();
        let pointer_before = self.advancer.current();
        self.advancer.commit(period_index);

        let unit_id = self.ports.issuer.issue(caller, period_index, quote.price);

        // Selling the last unit of a period moves the pointer right away.
        let advance = self.advancer.refresh(&self.registry, now);
        self.notify_advance(Advance {
            from: pointer_before,
            to: advance.to,
        });
        self.ports.listener.on_event(&SaleEvent::Minted {
            buyer: caller.to_string(),
            unit_id,
            period_index,
            price: quote.price,
        });

        info!(
            "✅ Sold unit {} to {} in period {} for {} ({} off, {} sold)",
            unit_id,
            caller,
            period_index,
            quote.price,
            quote.discount,
            self.supply.total_sold()
        );

        Ok(Sale {
            price: quote.price,
            period_index,
            unit_id,
        })
    }

    /// Price `sell` would charge at `now`, without committing anything
    pub fn quote(&self, now: Timestamp) -> Result<SaleQuote> {
        let period_index = self.advancer.peek(&self.registry, now);
        let period = self
            .registry
            .get(period_index)
            .ok_or(SaleError::NoActivePeriod)?;

        if period.is_exhausted() {
            return Err(SaleError::PeriodCapacityExceeded {
                index: period_index,
                max_supply: period.max_supply,
            });
        }

        let discount = self.rebate.discount(self.supply.total_sold());
        let quote = PriceCalculator::apply_discount(period.price, discount);

        debug!(
            "Quote at {}: period {} base {} -> {} ({} off)",
            now, period_index, quote.base_price, quote.price, quote.discount
        );

        Ok(SaleQuote {
            period_index,
            quote,
        })
    }

    /// Advance and persist the current-period pointer
    pub fn refresh(&mut self, now: Timestamp) -> PeriodIndex {
        let advance = self.advancer.refresh(&self.registry, now);
        self.notify_advance(advance);
        advance.to
    }

    /// Append a period (admin only)
    pub fn add_period(
        &mut self,
        caller: &str,
        now: Timestamp,
        params: PeriodParams,
    ) -> AdminResult<PeriodIndex> {
        self.ensure_admin(caller, "add period")?;

        let index =
            self.registry
                .add_period(params.end_time, params.max_supply, params.price, now)?;

        info!(
            "➕ Period {} added by {}: ends {}, supply {}, price {}",
            index, caller, params.end_time, params.max_supply, params.price
        );
        self.ports.listener.on_event(&SaleEvent::PeriodAdded {
            index,
            end_time: params.end_time,
            max_supply: params.max_supply,
            price: params.price,
        });

        Ok(index)
    }

    /// Replace the rebate curve parameters (admin only).
    /// Applies to the next price computed; past sales are untouched.
    pub fn change_rebate_config(
        &mut self,
        caller: &str,
        max_rebate: u8,
        curve_steepness: u64,
    ) -> AdminResult<()> {
        self.ensure_admin(caller, "change rebate config")?;

        let config = RebateConfig::new(max_rebate, curve_steepness)?;
        self.rebate = RebateCurve::new(config);

        info!(
            "⚙️  Rebate config changed by {}: max {}%, steepness {}",
            caller, max_rebate, curve_steepness
        );
        self.ports.listener.on_event(&SaleEvent::RebateConfigChanged {
            max_rebate,
            curve_steepness,
        });

        Ok(())
    }

    pub fn periods(&self) -> &[Period] {
        self.registry.periods()
    }

    /// Period a sale would land in at `now`; pointer is not moved
    pub fn current_period(&self, now: Timestamp) -> Option<(PeriodIndex, Period)> {
        let index = self.advancer.peek(&self.registry, now);
        self.registry
            .get(index)
            .map(|period| (index, period.clone()))
    }

    /// Committed pointer as of the last refresh or sale
    pub fn current_period_index(&self) -> PeriodIndex {
        self.advancer.current()
    }

    pub fn total_sold(&self) -> u64 {
        self.supply.total_sold()
    }

    pub fn rebate_config(&self) -> RebateConfig {
        *self.rebate.config()
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.ports
    }

    pub fn state(&self) -> SaleState {
        SaleState {
            periods: self.registry.periods().to_vec(),
            current_period: self.advancer.current(),
            total_sold: self.supply.total_sold(),
            rebate: *self.rebate.config(),
        }
    }

    pub fn stats(&self, now: Timestamp) -> SaleStats {
        let index = self.advancer.peek(&self.registry, now);
        let exhausted = index >= self.registry.len();

        SaleStats {
            total_sold: self.supply.total_sold(),
            period_count: self.registry.len(),
            current_period: (!exhausted).then_some(index),
            remaining_supply: self.registry.remaining_from(index, now),
            exhausted,
        }
    }

    fn ensure_admin(&self, caller: &str, action: &str) -> AdminResult<()> {
        if self.ports.admins.is_admin(caller) {
            return Ok(());
        }
        warn!("Rejected {} from non-admin {}", action, caller);
        Err(AdminError::Unauthorized(caller.to_string()))
    }

    fn notify_advance(&self, advance: Advance) {
        if !advance.moved() {
            return;
        }
        if advance.to >= self.registry.len() {
            info!("⏹️  No active periods left after period {}", advance.from);
        } else {
            debug!(
                "Period pointer advanced {} -> {} ({} skipped)",
                advance.from,
                advance.to,
                advance.skipped()
            );
        }
        self.ports.listener.on_event(&SaleEvent::PeriodAdvanced {
            from: advance.from,
            to: advance.to,
        });
    }
}
