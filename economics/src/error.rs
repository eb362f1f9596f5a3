//! Economics error types

use thiserror::Error;

/// Rejected rebate configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RebateConfigError {
    #[error("Max rebate out of range: {0}% (allowed 0-100)")]
    MaxRebateOutOfRange(u8),

    #[error("Curve steepness must be greater than zero")]
    ZeroSteepness,
}

pub type Result<T> = std::result::Result<T, RebateConfigError>;
