use std::sync::Arc;
use tranche_sale::*;

const ETHER: Amount = 1_000_000_000_000_000_000;
const NOW: Timestamp = 1_700_000_000;

struct Harness {
    engine: SaleEngine,
    ledger: Arc<InMemoryLedger>,
    events: Arc<EventLog>,
}

fn start(periods: &[PeriodParams], rebate: RebateConfig) -> Harness {
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.credit("user", 1_000 * ETHER);
    let events = Arc::new(EventLog::new());

    let ports = Collaborators::new(
        Arc::new(AdminSet::new(["admin"])),
        ledger.clone(),
        Arc::new(SequentialIssuer::new()),
    )
    .with_listener(events.clone());

    Harness {
        engine: SaleEngine::new(periods, rebate, NOW, ports).unwrap(),
        ledger,
        events,
    }
}

fn two_tranches() -> Vec<PeriodParams> {
    vec![
        PeriodParams::new(NOW + 3600, 10, ETHER),
        PeriodParams::new(NOW + 7200, 20, 3 * ETHER / 2),
    ]
}

#[test]
fn test_tranches_fill_in_order() {
    let mut sale = start(&two_tranches(), RebateConfig::default());

    for expected_id in 0..10u64 {
        let receipt = sale.engine.sell("user", NOW).unwrap();
        assert_eq!(receipt.period_index, 0);
        assert_eq!(receipt.unit_id, expected_id);
        assert_eq!(sale.engine.total_sold(), expected_id + 1);
    }
    assert_eq!(sale.engine.current_period_index(), 1);

    let eleventh = sale.engine.sell("user", NOW).unwrap();
    assert_eq!(eleventh.period_index, 1);

    for _ in 11..30 {
        assert_eq!(sale.engine.sell("user", NOW).unwrap().period_index, 1);
    }
    assert_eq!(sale.engine.sell("user", NOW), Err(SaleError::NoActivePeriod));

    let periods = sale.engine.periods();
    assert_eq!(periods[0].minted_count, 10);
    assert_eq!(periods[1].minted_count, 20);
}

#[test]
fn test_rebate_kicks_in_on_third_sale() {
    let mut sale = start(&two_tranches(), RebateConfig::default());

    assert_eq!(sale.engine.sell("user", NOW).unwrap().price, ETHER);
    assert_eq!(sale.engine.sell("user", NOW).unwrap().price, ETHER);
    assert_eq!(sale.engine.sell("user", NOW).unwrap().price, ETHER * 65 / 100);
}

#[test]
fn test_expired_period_is_skipped() {
    let mut sale = start(
        &[
            PeriodParams::new(NOW + 100, 10, ETHER),
            PeriodParams::new(NOW + 3600, 10, 2 * ETHER),
        ],
        RebateConfig::default(),
    );

    assert_eq!(sale.engine.refresh(NOW + 110), 1);

    let receipt = sale.engine.sell("user", NOW + 110).unwrap();
    assert_eq!(receipt.period_index, 1);
    assert_eq!(receipt.price, 2 * ETHER);
}

#[test]
fn test_refresh_jumps_over_several_periods() {
    let mut sale = start(
        &[
            PeriodParams::new(NOW + 100, 10, ETHER),
            PeriodParams::new(NOW + 200, 10, ETHER),
            PeriodParams::new(NOW + 3600, 10, ETHER),
        ],
        RebateConfig::default(),
    );

    assert_eq!(sale.engine.refresh(NOW + 210), 2);
    assert_eq!(sale.engine.periods()[1].minted_count, 0);
    assert_eq!(
        sale.events.events(),
        vec![SaleEvent::PeriodAdvanced { from: 0, to: 2 }]
    );
}

#[test]
fn test_non_admin_cannot_change_anything() {
    let mut sale = start(&two_tranches(), RebateConfig::default());
    let before = sale.engine.state();

    let result = sale
        .engine
        .add_period("user", NOW, PeriodParams::new(NOW + 9000, 5, ETHER));
    assert_eq!(result, Err(AdminError::Unauthorized("user".to_string())));

    let result = sale.engine.change_rebate_config("user", 10, 5);
    assert_eq!(result, Err(AdminError::Unauthorized("user".to_string())));

    assert_eq!(sale.engine.state(), before);
    assert!(sale.events.is_empty());
}

#[test]
fn test_exhausted_sale_reopens_after_add_period() {
    let mut sale = start(
        &[PeriodParams::new(NOW + 100, 1, ETHER)],
        RebateConfig::default(),
    );
    sale.engine.sell("user", NOW).unwrap();

    for _ in 0..3 {
        assert_eq!(sale.engine.sell("user", NOW), Err(SaleError::NoActivePeriod));
    }
    assert!(sale.engine.current_period(NOW).is_none());

    let index = sale
        .engine
        .add_period("admin", NOW, PeriodParams::new(NOW + 500, 5, 2 * ETHER))
        .unwrap();
    assert_eq!(index, 1);

    let receipt = sale.engine.sell("user", NOW).unwrap();
    assert_eq!(receipt.period_index, 1);
    assert_eq!(receipt.unit_id, 1);
}

#[test]
fn test_add_period_does_not_rewind_pointer() {
    let mut sale = start(
        &[
            PeriodParams::new(NOW + 100, 5, ETHER),
            PeriodParams::new(NOW + 200, 5, ETHER),
        ],
        RebateConfig::default(),
    );
    sale.engine.refresh(NOW + 150);

    // The new period is only reached once period 1 closes
    sale.engine
        .add_period("admin", NOW + 150, PeriodParams::new(NOW + 1000, 5, ETHER))
        .unwrap();
    assert_eq!(sale.engine.refresh(NOW + 150), 1);
    assert_eq!(sale.engine.refresh(NOW + 250), 2);
}

#[test]
fn test_add_period_validation() {
    let mut sale = start(&two_tranches(), RebateConfig::default());

    let past = sale
        .engine
        .add_period("admin", NOW, PeriodParams::new(NOW, 5, ETHER));
    assert!(matches!(past, Err(AdminError::InvalidPeriod(_))));

    let placeholder = sale
        .engine
        .add_period("admin", NOW, PeriodParams::new(NOW + 10_000, 0, ETHER));
    assert_eq!(placeholder, Ok(2));
    assert!(sale.engine.periods()[2].is_exhausted());
}

#[test]
fn test_quote_matches_sell() {
    let mut sale = start(&two_tranches(), RebateConfig::new(50, 3).unwrap());

    let mut now = NOW;
    for _ in 0..30 {
        let quote = sale.engine.quote(now).unwrap();
        let receipt = sale.engine.sell("user", now).unwrap();
        assert_eq!(receipt.price, quote.price());
        assert_eq!(receipt.period_index, quote.period_index);
        now += 60;
    }
}

#[test]
fn test_counters_never_exceed_supply() {
    let mut sale = start(
        &[
            PeriodParams::new(NOW + 50, 3, ETHER),
            PeriodParams::new(NOW + 400, 0, ETHER),
            PeriodParams::new(NOW + 500, 7, ETHER),
            PeriodParams::new(NOW + 900, 4, ETHER),
        ],
        RebateConfig::default(),
    );

    // Deterministic pseudo-random walk over time
    let mut seed: u64 = 0x5eed;
    let mut now = NOW;
    let mut previous: Vec<u64> = vec![0; sale.engine.periods().len()];

    for _ in 0..200 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        now += seed >> 60;

        let _ = sale.engine.sell("user", now);

        for (index, period) in sale.engine.periods().iter().enumerate() {
            assert!(period.minted_count <= period.max_supply);
            assert!(period.minted_count >= previous[index]);
            previous[index] = period.minted_count;
        }
        let minted: u64 = sale.engine.periods().iter().map(|p| p.minted_count).sum();
        assert_eq!(minted, sale.engine.total_sold());
    }
}

#[test]
fn test_failed_payment_is_retry_safe() {
    let mut sale = start(&two_tranches(), RebateConfig::default());
    sale.ledger.credit("poor", ETHER / 2);
    let before = sale.engine.state();

    let result = sale.engine.sell("poor", NOW);
    assert!(matches!(
        result,
        Err(SaleError::PaymentFailed(PaymentError::InsufficientBalance { .. }))
    ));
    assert_eq!(sale.engine.state(), before);
    assert_eq!(sale.ledger.balance_of("poor"), ETHER / 2);

    sale.ledger.credit("poor", ETHER);
    let receipt = sale.engine.sell("poor", NOW).unwrap();
    assert_eq!(receipt.unit_id, 0);
    assert_eq!(sale.ledger.balance_of("poor"), ETHER / 2);
}

#[test]
fn test_rebate_uses_global_counter_across_periods() {
    let mut sale = start(
        &[
            PeriodParams::new(NOW + 100, 2, ETHER),
            PeriodParams::new(NOW + 200, 5, 2 * ETHER),
        ],
        RebateConfig::default(),
    );

    sale.engine.sell("user", NOW).unwrap();
    sale.engine.sell("user", NOW).unwrap();

    // First sale of period 1 still sees two units sold overall
    let receipt = sale.engine.sell("user", NOW).unwrap();
    assert_eq!(receipt.period_index, 1);
    assert_eq!(receipt.price, 2 * ETHER * 65 / 100);
}

#[test]
fn test_state_survives_json() {
    let mut sale = start(&two_tranches(), RebateConfig::default());
    for _ in 0..12 {
        sale.engine.sell("user", NOW).unwrap();
    }

    let json = serde_json::to_string(&sale.engine.state()).unwrap();
    let state: SaleState = serde_json::from_str(&json).unwrap();

    let ports = sale.engine.collaborators().clone();
    let restored = SaleEngine::restore(state, ports).unwrap();
    assert_eq!(restored.state(), sale.engine.state());
    assert_eq!(restored.quote(NOW).unwrap(), sale.engine.quote(NOW).unwrap());
}
