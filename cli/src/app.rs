//! Wires a sale config, its snapshot directory and the engine together

use anyhow::{bail, Context, Result};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use tranche_sale::{
    Amount, Collaborators, InMemoryLedger, SaleConfig, SaleEngine, SequentialIssuer, Timestamp,
};
use tranche_storage::{SaleSnapshot, SnapshotStore};

pub struct SaleApp {
    store: SnapshotStore,
    engine: SaleEngine,
    ledger: Arc<InMemoryLedger>,
}

impl SaleApp {
    /// Start a fresh sale from the config and write its first snapshot
    pub fn init(config: &SaleConfig, now: Timestamp, force: bool) -> Result<Self> {
        let store = open_store(config)?;
        if store.has_sale() && !force {
            bail!(
                "a sale already exists in {} (use --force to start over)",
                store.data_dir().display()
            );
        }

        let ledger = Arc::new(InMemoryLedger::from_balances(config.accounts.clone()));
        let ports = Collaborators::new(
            Arc::new(config.admin_set()),
            ledger.clone(),
            Arc::new(SequentialIssuer::new()),
        );
        let engine = SaleEngine::new(&config.period_params(), config.rebate, now, ports)?;

        let app = Self {
            store,
            engine,
            ledger,
        };
        app.save()?;
        info!("📁 Sale initialized in {}", app.store.data_dir().display());
        Ok(app)
    }

    /// Resume the sale saved under the config's data directory
    pub fn open(config: &SaleConfig) -> Result<Self> {
        let store = open_store(config)?;
        let SaleSnapshot { state, ledger } = store.load_sale()?.with_context(|| {
            format!(
                "no sale found in {} (run `init` first)",
                store.data_dir().display()
            )
        })?;
        let ledger = Arc::new(InMemoryLedger::from(ledger));

        // Unit ids are handed out in sale order starting at zero
        let issuer = SequentialIssuer::starting_at(state.total_sold);
        let ports = Collaborators::new(Arc::new(config.admin_set()), ledger.clone(), Arc::new(issuer));
        let engine = SaleEngine::restore(state, ports)?;

        Ok(Self {
            store,
            engine,
            ledger,
        })
    }

    /// Persist engine state and ledger in a single snapshot
    pub fn save(&self) -> Result<()> {
        self.store.save_sale(&SaleSnapshot {
            state: self.engine.state(),
            ledger: self.ledger.snapshot(),
        })?;
        Ok(())
    }

    pub fn engine(&self) -> &SaleEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SaleEngine {
        &mut self.engine
    }

    /// Credit a demo account and return its new balance
    pub fn fund(&self, account: &str, amount: Amount) -> Amount {
        self.ledger.credit(account, amount)
    }

    pub fn balance_of(&self, account: &str) -> Amount {
        self.ledger.balance_of(account)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.store.data_dir().to_path_buf()
    }
}

fn open_store(config: &SaleConfig) -> Result<SnapshotStore> {
    SnapshotStore::open(&config.data_dir)
        .with_context(|| format!("cannot open data directory {}", config.data_dir))
}

/// Parse an amount given on the command line, `_` separators allowed
pub fn parse_amount(value: &str) -> std::result::Result<Amount, String> {
    value
        .trim()
        .replace('_', "")
        .parse::<Amount>()
        .map_err(|e| format!("invalid amount {:?}: {}", value, e))
}
