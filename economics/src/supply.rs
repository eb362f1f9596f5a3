//! Cumulative sale supply tracking

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SupplyStats {
    /// Units sold across every period since the sale started
    pub total_sold: u64,
}

/// Running total of units sold. Never reset by a period transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SupplyCounter {
    stats: SupplyStats,
}

impl SupplyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a persisted total
    pub fn starting_at(total_sold: u64) -> Self {
        Self {
            stats: SupplyStats { total_sold },
        }
    }

    pub fn record_sale(&mut self) {
        self.stats.total_sold = self.stats.total_sold.saturating_add(1);
    }

    pub fn total_sold(&self) -> u64 {
        self.stats.total_sold
    }

    pub fn stats(&self) -> &SupplyStats {
        &self.stats
    }
}
