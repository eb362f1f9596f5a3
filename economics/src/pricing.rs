//! Sale price calculation

use serde::{Deserialize, Serialize};

use crate::constants::DISCOUNT_SCALE;
use crate::rebate::Discount;
use crate::Amount;

/// Breakdown of a discounted price
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceQuote {
    pub base_price: Amount,
    pub discount: Discount,
    pub reduction: Amount,
    pub price: Amount,
}

pub struct PriceCalculator;

impl PriceCalculator {
    /// `price = base - floor(base * discount)`
    ///
    /// The reduction is rounded down so the charged price never drops
    /// below what the exact fraction would give.
    pub fn apply_discount(base_price: Amount, discount: Discount) -> PriceQuote {
        let reduction = Self::scaled_fraction(base_price, discount.scaled());

        PriceQuote {
            base_price,
            discount,
            reduction,
            price: base_price - reduction,
        }
    }

    /// floor(amount * scaled / DISCOUNT_SCALE) for scaled <= DISCOUNT_SCALE,
    /// split so no intermediate product overflows.
    fn scaled_fraction(amount: Amount, scaled: u128) -> Amount {
        let whole = amount / DISCOUNT_SCALE;
        let rest = amount % DISCOUNT_SCALE;
        whole * scaled + rest * scaled / DISCOUNT_SCALE
    }
}
