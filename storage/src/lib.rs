//! Tranche Sale Storage - File-Based Snapshots
//!
//! The engine keeps everything in memory and is snapshotted after every
//! committed change:
//! - Bincode copy for fast, exact reloads
//! - Pretty JSON copy for operators to read
//! - Each file written to a temp path and renamed into place
//!
//! Engine state and ledger balances travel in one [`SaleSnapshot`] so a
//! sale is never persisted without the payment that paid for it.

use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use tranche_sale::{LedgerSnapshot, SaleState};

/// Snapshot name of the sale (engine state plus ledger)
pub const SALE: &str = "sale";

/// Engine state and ledger balances committed together
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleSnapshot {
    pub state: SaleState,
    pub ledger: LedgerSnapshot,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("Invalid snapshot name: {0}")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Directory of named snapshots
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    /// Open (and create if needed) the snapshot directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data_dir = path.as_ref().to_path_buf();
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }
        Ok(Self { data_dir })
    }

    /// Write both copies; the bincode rename is the commit point
    pub fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let (bin_path, json_path) = self.paths(name)?;

        let json = serde_json::to_vec_pretty(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        write_atomic(&json_path, &json)?;

        let bin = bincode::serialize(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        write_atomic(&bin_path, &bin)?;

        debug!("Saved snapshot {} to {}", name, self.data_dir.display());
        Ok(())
    }

    /// Load a snapshot, bincode first and JSON as fallback
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let (bin_path, json_path) = self.paths(name)?;

        if bin_path.exists() {
            let data = fs::read(&bin_path)?;
            return bincode::deserialize(&data)
                .map_err(|e| StorageError::SerializationError(e.to_string()));
        }

        if json_path.exists() {
            let data = fs::read(&json_path)?;
            return serde_json::from_slice(&data)
                .map_err(|e| StorageError::SerializationError(e.to_string()));
        }

        Err(StorageError::SnapshotNotFound(name.to_string()))
    }

    /// Load if present
    pub fn load_optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.load(name) {
            Ok(data) => Ok(Some(data)),
            Err(StorageError::SnapshotNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn has_snapshot(&self, name: &str) -> bool {
        match self.paths(name) {
            Ok((bin_path, json_path)) => bin_path.exists() || json_path.exists(),
            Err(_) => false,
        }
    }

    pub fn save_sale(&self, snapshot: &SaleSnapshot) -> Result<()> {
        self.save(SALE, snapshot)
    }

    pub fn load_sale(&self) -> Result<Option<SaleSnapshot>> {
        self.load_optional(SALE)
    }

    pub fn has_sale(&self) -> bool {
        self.has_snapshot(SALE)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn paths(&self, name: &str) -> Result<(PathBuf, PathBuf)> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidName(name.to_string()));
        }

        Ok((
            self.data_dir.join(format!("{}.bin", name)),
            self.data_dir.join(format!("{}.json", name)),
        ))
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
