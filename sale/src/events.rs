//! Sale notifications for indexers and observers

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::{Amount, PeriodIndex, Timestamp, UnitId};

/// Ordered record of something the engine committed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SaleEvent {
    /// Exactly one per successful sale
    Minted {
        buyer: String,
        unit_id: UnitId,
        period_index: PeriodIndex,
        price: Amount,
    },
    PeriodAdded {
        index: PeriodIndex,
        end_time: Timestamp,
        max_supply: u64,
        price: Amount,
    },
    RebateConfigChanged {
        max_rebate: u8,
        curve_steepness: u64,
    },
    PeriodAdvanced {
        from: PeriodIndex,
        to: PeriodIndex,
    },
}

/// Receives events in commit order
pub trait SaleListener: Send + Sync {
    fn on_event(&self, _event: &SaleEvent) {}
}

pub struct NoopListener;

impl SaleListener for NoopListener {}

const DEFAULT_EVENT_CAPACITY: usize = 10_000;

/// Bounded in-memory event history, oldest evicted first
#[derive(Debug)]
pub struct EventLog {
    events: Mutex<VecDeque<SaleEvent>>,
    capacity: usize,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn events(&self) -> Vec<SaleEvent> {
        self.events.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Only the `Minted` events
    pub fn minted(&self) -> Vec<SaleEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, SaleEvent::Minted { .. }))
            .cloned()
            .collect()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SaleListener for EventLog {
    fn on_event(&self, event: &SaleEvent) {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advanced(to: PeriodIndex) -> SaleEvent {
        SaleEvent::PeriodAdvanced { from: 0, to }
    }

    #[test]
    fn test_event_log_keeps_order() {
        let log = EventLog::new();
        log.on_event(&advanced(1));
        log.on_event(&advanced(2));

        assert_eq!(log.events(), vec![advanced(1), advanced(2)]);
    }

    #[test]
    fn test_event_log_evicts_oldest() {
        let log = EventLog::with_capacity(2);
        log.on_event(&advanced(1));
        log.on_event(&advanced(2));
        log.on_event(&advanced(3));

        assert_eq!(log.events(), vec![advanced(2), advanced(3)]);
    }

    #[test]
    fn test_minted_filter() {
        let log = EventLog::new();
        log.on_event(&advanced(1));
        log.on_event(&SaleEvent::Minted {
            buyer: "alice".to_string(),
            unit_id: 0,
            period_index: 1,
            price: 10,
        });

        assert_eq!(log.minted().len(), 1);
        assert_eq!(log.len(), 2);
    }
}
