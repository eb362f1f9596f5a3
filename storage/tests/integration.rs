use std::sync::Arc;
use tempfile::tempdir;
use tranche_sale::*;
use tranche_storage::{SaleSnapshot, SnapshotStore, StorageError};

const NOW: Timestamp = 1_700_000_000;

fn engine_with(ledger: Arc<InMemoryLedger>) -> SaleEngine {
    let ports = Collaborators::new(
        Arc::new(AdminSet::new(["admin"])),
        ledger,
        Arc::new(SequentialIssuer::new()),
    );
    SaleEngine::new(
        &[
            PeriodParams::new(NOW + 100, 2, 1_000),
            PeriodParams::new(NOW + 200, 4, 2_000),
        ],
        RebateConfig::default(),
        NOW,
        ports,
    )
    .unwrap()
}

fn snapshot(engine: &SaleEngine, ledger: &InMemoryLedger) -> SaleSnapshot {
    SaleSnapshot {
        state: engine.state(),
        ledger: ledger.snapshot(),
    }
}

#[test]
fn test_sale_round_trip() {
    let dir = tempdir().unwrap();
    let store = SnapshotStore::open(dir.path()).unwrap();
    assert!(store.load_sale().unwrap().is_none());
    assert!(!store.has_sale());

    let ledger = Arc::new(InMemoryLedger::new());
    ledger.credit("alice", 100_000);
    let mut engine = engine_with(ledger.clone());
    for _ in 0..3 {
        engine.sell("alice", NOW).unwrap();
    }

    store.save_sale(&snapshot(&engine, &ledger)).unwrap();
    assert!(store.has_sale());

    let loaded = store.load_sale().unwrap().unwrap();
    assert_eq!(loaded.state, engine.state());
    assert_eq!(loaded.state.current_period, 1);

    let restored_ledger = InMemoryLedger::from(loaded.ledger);
    assert_eq!(restored_ledger.balance_of("alice"), ledger.balance_of("alice"));

    let ports = engine.collaborators().clone();
    let restored = SaleEngine::restore(loaded.state, ports).unwrap();
    assert_eq!(restored.quote(NOW).unwrap(), engine.quote(NOW).unwrap());
}

#[test]
fn test_latest_save_wins() {
    let dir = tempdir().unwrap();
    let store = SnapshotStore::open(dir.path()).unwrap();

    let ledger = Arc::new(InMemoryLedger::new());
    ledger.credit("alice", 100_000);
    let mut engine = engine_with(ledger.clone());

    store.save_sale(&snapshot(&engine, &ledger)).unwrap();
    engine.sell("alice", NOW).unwrap();
    store.save_sale(&snapshot(&engine, &ledger)).unwrap();

    let loaded = store.load_sale().unwrap().unwrap();
    assert_eq!(loaded.state.total_sold, 1);
    assert_eq!(loaded.ledger.balances["alice"], 99_000);
}

#[test]
fn test_failed_save_keeps_state_and_ledger_together() {
    let dir = tempdir().unwrap();
    let store = SnapshotStore::open(dir.path()).unwrap();

    let ledger = Arc::new(InMemoryLedger::new());
    ledger.credit("alice", 100_000);
    let mut engine = engine_with(ledger.clone());
    store.save_sale(&snapshot(&engine, &ledger)).unwrap();

    std::fs::create_dir(dir.path().join("sale.bin.tmp")).unwrap();
    engine.sell("alice", NOW).unwrap();
    assert!(store.save_sale(&snapshot(&engine, &ledger)).is_err());

    let loaded = store.load_sale().unwrap().unwrap();
    assert_eq!(loaded.state.total_sold, 0);
    assert_eq!(loaded.ledger.balances["alice"], 100_000);
}

#[test]
fn test_corrupt_snapshot_is_an_error() {
    let dir = tempdir().unwrap();
    let store = SnapshotStore::open(dir.path()).unwrap();
    std::fs::write(dir.path().join("sale.bin"), b"\x01").unwrap();

    assert!(matches!(
        store.load_sale(),
        Err(StorageError::SerializationError(_))
    ));
}
