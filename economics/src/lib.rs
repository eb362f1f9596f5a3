//! Tranche Sale Economics
//!
//! Pricing primitives for the primary sale:
//! - Rebate curve driven by cumulative units sold
//! - Fixed-point price reduction (always rounds in the buyer's favour)
//! - Cumulative supply tracking

pub mod error;
pub mod pricing;
pub mod rebate;
pub mod supply;

pub use error::{RebateConfigError, Result};
pub use pricing::{PriceCalculator, PriceQuote};
pub use rebate::{Discount, RebateConfig, RebateCurve};
pub use supply::{SupplyCounter, SupplyStats};

/// Amount in the smallest unit of the payment asset.
pub type Amount = u128;

/// Economic constants
pub mod constants {
    /// Fixed-point scale for discount fractions (1.0 == 10^9)
    pub const DISCOUNT_SCALE: u128 = 1_000_000_000;

    /// Upper bound for `max_rebate` (percent)
    pub const MAX_REBATE_PERCENT: u8 = 100;

    /// Default asymptotic rebate cap (percent)
    pub const DEFAULT_MAX_REBATE: u8 = 70;

    /// Default curve steepness
    pub const DEFAULT_CURVE_STEEPNESS: u64 = 1;

    /// Units sold before the curve starts moving
    pub const UNDISCOUNTED_UNITS: u64 = 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_constants() {
        assert_eq!(constants::DISCOUNT_SCALE, 1_000_000_000);
        assert!(constants::DEFAULT_MAX_REBATE <= constants::MAX_REBATE_PERCENT);
        assert!(constants::DEFAULT_CURVE_STEEPNESS > 0);
    }
}
