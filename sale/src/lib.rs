//! Tranche Sale Engine
//!
//! Gates a primary sale behind an ordered sequence of time- and
//! supply-bounded periods:
//! - Period registry (append-only, per-period sold counters)
//! - Lazy period advancement driven by an explicit `now`
//! - Rebate pricing over cumulative units sold
//! - Admission, payment collection and issuance, committed atomically
//!
//! Payment, issuance and admin checks are external collaborators, see
//! [`ports`].

pub mod advancer;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod period;
pub mod ports;
pub mod shared;

pub use advancer::{scan, Advance, PeriodAdvancer};
pub use config::{ConfigError, PeriodEntry, SaleConfig};
pub use engine::{Sale, SaleEngine, SaleQuote, SaleState, SaleStats};
pub use error::{
    AdminError, AdminResult, PaymentError, RegistryError, Result, SaleError, StateError,
};
pub use events::{EventLog, NoopListener, SaleEvent, SaleListener};
pub use period::{Period, PeriodParams, PeriodRegistry};
pub use ports::{
    AdminAuthority, AdminSet, Collaborators, InMemoryLedger, LedgerSnapshot, PaymentLedger,
    SequentialIssuer, UnitIssuer,
};
pub use shared::SharedSaleEngine;

pub use tranche_economics::{Amount, Discount, PriceQuote, RebateConfig};

/// Unix timestamp in seconds
pub type Timestamp = u64;

/// Position of a period in insertion order
pub type PeriodIndex = usize;

/// Identifier returned by the issuer for a sold unit
pub type UnitId = u64;

/// Sale module version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
