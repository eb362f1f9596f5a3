//! Sale configuration file (sale.toml)
//!
//! Example:
//! ```toml
//! admins = ["admin"]
//! data_dir = "data"
//!
//! [rebate]
//! max_rebate = 70
//! curve_steepness = 1
//!
//! [[periods]]
//! end_time = 1767225600
//! max_supply = 10
//! price = "1000000000000000000"
//!
//! [accounts]
//! alice = "5000000000000000000"
//! ```
//!
//! Prices and balances accept integers or decimal strings; TOML integers
//! stop at i64 and payment amounts routinely exceed that.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use tranche_economics::{RebateConfig, RebateConfigError};

use crate::period::PeriodParams;
use crate::ports::AdminSet;
use crate::{Amount, Timestamp};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid rebate config: {0}")]
    InvalidRebate(#[from] RebateConfigError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// One `[[periods]]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodEntry {
    pub end_time: Timestamp,
    pub max_supply: u64,
    #[serde(with = "amount")]
    pub price: Amount,
}

impl From<&PeriodEntry> for PeriodParams {
    fn from(entry: &PeriodEntry) -> Self {
        PeriodParams::new(entry.end_time, entry.max_supply, entry.price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleConfig {
    pub admins: Vec<String>,

    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default)]
    pub rebate: RebateConfig,

    #[serde(default)]
    pub periods: Vec<PeriodEntry>,

    /// Opening balances for the demo ledger
    #[serde(default, with = "amount_map")]
    pub accounts: BTreeMap<String, Amount>,
}

fn default_data_dir() -> String {
    "data".to_string()
}

impl SaleConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: SaleConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admins.iter().all(|a| a.trim().is_empty()) {
            return Err(ConfigError::Invalid("at least one admin is required".to_string()));
        }
        if self.periods.is_empty() {
            return Err(ConfigError::Invalid("at least one period is required".to_string()));
        }
        if self.periods.iter().all(|p| p.max_supply == 0) {
            return Err(ConfigError::Invalid(
                "at least one period must have supply".to_string(),
            ));
        }
        self.rebate.validate()?;
        Ok(())
    }

    pub fn period_params(&self) -> Vec<PeriodParams> {
        self.periods.iter().map(PeriodParams::from).collect()
    }

    pub fn admin_set(&self) -> AdminSet {
        AdminSet::new(self.admins.iter().filter(|a| !a.trim().is_empty()).cloned())
    }
}

/// Amount as a TOML integer or decimal string; always written as a string
pub mod amount {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::Amount;

    #[derive(Deserialize)]
    #[serde(untagged)]
    pub(crate) enum AmountRepr {
        Int(u64),
        Text(String),
    }

    impl AmountRepr {
        pub(crate) fn into_amount<E: serde::de::Error>(self) -> Result<Amount, E> {
            match self {
                AmountRepr::Int(value) => Ok(value as Amount),
                AmountRepr::Text(text) => text
                    .trim()
                    .replace('_', "")
                    .parse::<Amount>()
                    .map_err(|e| E::custom(format!("invalid amount {:?}: {}", text, e))),
            }
        }
    }

    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        AmountRepr::deserialize(deserializer)?.into_amount()
    }
}

mod amount_map {
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    use super::amount::AmountRepr;
    use crate::Amount;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<String, Amount>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (account, value) in map {
            out.serialize_entry(account, &value.to_string())?;
        }
        out.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Amount>, D::Error> {
        BTreeMap::<String, AmountRepr>::deserialize(deserializer)?
            .into_iter()
            .map(|(account, repr)| repr.into_amount().map(|value| (account, value)))
            .collect()
    }
}
