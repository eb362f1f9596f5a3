//! Lazy period advancement
//!
//! The current period is only recomputed when someone asks: every quote and
//! every sale runs the scan against an explicit `now`. There are no timers.

use serde::{Deserialize, Serialize};

use crate::period::{Period, PeriodRegistry};
use crate::{PeriodIndex, Timestamp};

/// Skip expired or exhausted periods starting at `start`.
///
/// Returns `periods.len()` when nothing is left.
pub fn scan(periods: &[Period], start: PeriodIndex, now: Timestamp) -> PeriodIndex {
    let mut index = start.min(periods.len());
    while index < periods.len() && !periods[index].is_open(now) {
        index += 1;
    }
    index
}

/// Pointer movement produced by a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    pub from: PeriodIndex,
    pub to: PeriodIndex,
}

impl Advance {
    pub fn moved(&self) -> bool {
        self.to != self.from
    }

    /// Periods passed over, including ones that were never sold from
    pub fn skipped(&self) -> usize {
        self.to - self.from
    }
}

/// Monotonic pointer into the period registry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PeriodAdvancer {
    current: PeriodIndex,
}

impl PeriodAdvancer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(current: PeriodIndex) -> Self {
        Self { current }
    }

    /// Committed pointer; may lag behind what a scan would return
    pub fn current(&self) -> PeriodIndex {
        self.current
    }

    /// Where the pointer would land at `now`, without moving it
    pub fn peek(&self, registry: &PeriodRegistry, now: Timestamp) -> PeriodIndex {
        scan(registry.periods(), self.current, now)
    }

    /// Advance and persist the pointer
    pub fn refresh(&mut self, registry: &PeriodRegistry, now: Timestamp) -> Advance {
        let from = self.current;
        self.current = self.peek(registry, now);
        Advance {
            from,
            to: self.current,
        }
    }

    /// Persist a pointer obtained from `peek`. Never moves backwards.
    pub fn commit(&mut self, to: PeriodIndex) -> Advance {
        let from = self.current;
        self.current = self.current.max(to);
        Advance {
            from,
            to: self.current,
        }
    }

    /// True once the pointer has run off the end of the registry
    pub fn is_exhausted(&self, registry: &PeriodRegistry) -> bool {
        self.current >= registry.len()
    }
}
