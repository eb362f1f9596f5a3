//! Sale error types

use thiserror::Error;
use tranche_economics::RebateConfigError;

use crate::PeriodIndex;

/// Rejections from the payment ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u128, available: u128 },

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Payment rejected: {0}")]
    Rejected(String),
}

/// Sale admission failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SaleError {
    #[error("No active periods left")]
    NoActivePeriod,

    #[error("Current period max supply reached: period {index}, max supply {max_supply}")]
    PeriodCapacityExceeded { index: PeriodIndex, max_supply: u64 },

    #[error("Payment failed: {0}")]
    PaymentFailed(#[from] PaymentError),
}

/// Failures of admin-gated operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error("Unauthorized: {0} lacks admin capability")]
    Unauthorized(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid rebate config: {0}")]
    InvalidRebateConfig(#[from] RebateConfigError),
}

/// Registry-level counter failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Capacity exceeded: period {index}, max supply {max_supply}")]
    CapacityExceeded { index: PeriodIndex, max_supply: u64 },

    #[error("Unknown period: {0}")]
    UnknownPeriod(PeriodIndex),
}

/// A persisted state that cannot be resumed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Period {index} minted {minted} of {max_supply}")]
    OverMinted {
        index: PeriodIndex,
        minted: u64,
        max_supply: u64,
    },

    #[error("Current period {current} is past the end of {len} periods")]
    PointerOutOfRange { current: PeriodIndex, len: usize },

    #[error("Period counters sum to {minted}, total sold is {total_sold}")]
    CounterMismatch { minted: u128, total_sold: u64 },

    #[error("Invalid rebate config: {0}")]
    InvalidRebateConfig(#[from] RebateConfigError),
}

impl From<RegistryError> for SaleError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::CapacityExceeded { index, max_supply } => {
                SaleError::PeriodCapacityExceeded { index, max_supply }
            }
            RegistryError::UnknownPeriod(_) => SaleError::NoActivePeriod,
        }
    }
}

pub type Result<T> = std::result::Result<T, SaleError>;
pub type AdminResult<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(SaleError::NoActivePeriod.to_string(), "No active periods left");

        let err = SaleError::PeriodCapacityExceeded {
            index: 1,
            max_supply: 20,
        };
        assert_eq!(
            err.to_string(),
            "Current period max supply reached: period 1, max supply 20"
        );
    }

    #[test]
    fn test_payment_error_conversion() {
        let err: SaleError = PaymentError::UnknownAccount("bob".to_string()).into();
        assert_eq!(
            err,
            SaleError::PaymentFailed(PaymentError::UnknownAccount("bob".to_string()))
        );
    }

    #[test]
    fn test_registry_error_conversion() {
        let err: SaleError = RegistryError::CapacityExceeded {
            index: 0,
            max_supply: 10,
        }
        .into();
        assert!(matches!(err, SaleError::PeriodCapacityExceeded { index: 0, .. }));
    }
}
