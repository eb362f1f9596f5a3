//! Rebate curve
//!
//! Maps the cumulative number of units sold to a discount fraction. The
//! first unit is always sold at full price; after that the discount follows
//!
//! ```text
//!   m           = total_sold - 1
//!   discount(n) = max_rebate/100 * m / (m + curve_steepness)
//! ```
//!
//! which starts at zero, grows with every sale and approaches `max_rebate`
//! without ever reaching it. Everything is evaluated in fixed point with
//! `DISCOUNT_SCALE` and rounded down.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    DEFAULT_CURVE_STEEPNESS, DEFAULT_MAX_REBATE, DISCOUNT_SCALE, MAX_REBATE_PERCENT,
    UNDISCOUNTED_UNITS,
};
use crate::error::{RebateConfigError, Result};

/// Admin-tunable shape of the rebate curve
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RebateConfig {
    /// Asymptotic cap in percent (0-100)
    pub max_rebate: u8,
    /// Sales needed to reach half of the cap; larger means a slower curve
    pub curve_steepness: u64,
}

impl RebateConfig {
    /// Create a validated configuration
    pub fn new(max_rebate: u8, curve_steepness: u64) -> Result<Self> {
        let config = Self {
            max_rebate,
            curve_steepness,
        };
        config.validate()?;
        Ok(config)
    }

    /// Configuration that never discounts
    pub fn disabled() -> Self {
        Self {
            max_rebate: 0,
            curve_steepness: DEFAULT_CURVE_STEEPNESS,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rebate > MAX_REBATE_PERCENT {
            return Err(RebateConfigError::MaxRebateOutOfRange(self.max_rebate));
        }
        if self.curve_steepness == 0 {
            return Err(RebateConfigError::ZeroSteepness);
        }
        Ok(())
    }
}

impl Default for RebateConfig {
    fn default() -> Self {
        Self {
            max_rebate: DEFAULT_MAX_REBATE,
            curve_steepness: DEFAULT_CURVE_STEEPNESS,
        }
    }
}

/// Discount fraction scaled by `DISCOUNT_SCALE`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Discount(u128);

impl Discount {
    pub const ZERO: Discount = Discount(0);

    /// Build from an already-scaled value, clamped to 1.0
    pub fn from_scaled(scaled: u128) -> Self {
        Discount(scaled.min(DISCOUNT_SCALE))
    }

    /// Build from whole percent, clamped to 100
    pub fn from_percent(percent: u8) -> Self {
        let percent = percent.min(MAX_REBATE_PERCENT) as u128;
        Discount(percent * DISCOUNT_SCALE / 100)
    }

    pub fn scaled(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Discount in basis points, rounded down
    pub fn basis_points(&self) -> u128 {
        self.0 * 10_000 / DISCOUNT_SCALE
    }
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bps = self.basis_points();
        write!(f, "{}.{:02}%", bps / 100, bps % 100)
    }
}

/// Saturating discount curve over cumulative sales
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebateCurve {
    config: RebateConfig,
}

impl RebateCurve {
    pub fn new(config: RebateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RebateConfig {
        &self.config
    }

    /// Discount applied to the next sale after `total_sold` units
    pub fn discount(&self, total_sold: u64) -> Discount {
        let progressed = total_sold.saturating_sub(UNDISCOUNTED_UNITS) as u128;
        if progressed == 0 || self.config.max_rebate == 0 {
            return Discount::ZERO;
        }

        // max_rebate <= 100 and progressed < 2^64, so the numerator stays
        // far below u128::MAX.
        let numerator = self.config.max_rebate as u128 * progressed * DISCOUNT_SCALE;
        let denominator = 100 * (progressed + self.config.curve_steepness as u128);

        Discount(numerator / denominator)
    }

    /// Upper bound the curve approaches
    pub fn ceiling(&self) -> Discount {
        Discount::from_percent(self.config.max_rebate)
    }
}

impl Default for RebateCurve {
    fn default() -> Self {
        Self::new(RebateConfig::default())
    }
}

impl From<RebateConfig> for RebateCurve {
    fn from(config: RebateConfig) -> Self {
        Self::new(config)
    }
}
