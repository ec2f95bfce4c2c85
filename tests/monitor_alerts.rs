//! End-to-end alerting: fake ledger → ingestion client → monitor → sink.

use alloy::primitives::Address;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;

use contract_monitor::events::EventCategory;
use contract_monitor::ingestion::IngestionClient;
use contract_monitor::monitor::{run_checks, ContractMonitor, MonitorError, MonitorSettings, Severity};
use contract_monitor::observability::Observation;

mod common;
use common::{
    dispute_entry, liquidation_entry, settlement_entry, tx, FakeLedger, ManualClock, RecordingAlertSink,
    RecordingObserver, DISPUTER, LIQUIDATOR,
};

const CONTRACT: Address = Address::repeat_byte(0xcc);

struct Harness {
    ledger: FakeLedger,
    client: Arc<IngestionClient<FakeLedger>>,
    sink: RecordingAlertSink,
    observer: RecordingObserver,
    monitor: ContractMonitor<IngestionClient<FakeLedger>, RecordingAlertSink>,
}

fn harness(settings: MonitorSettings) -> Harness {
    let ledger = FakeLedger::new();
    let observer = RecordingObserver::default();
    let client = Arc::new(
        IngestionClient::new(ledger.clone(), CONTRACT, Arc::new(observer.clone()))
            .with_clock(Arc::new(ManualClock::new(1_000))),
    );
    let sink = RecordingAlertSink::default();
    let monitor = ContractMonitor::new(
        Arc::clone(&client),
        sink.clone(),
        Arc::new(observer.clone()),
        MonitorSettings { amount_decimals: 0, ..settings },
    );
    Harness { ledger, client, sink, observer, monitor }
}

fn unit_price(_timestamp: u64) -> Decimal {
    dec!(1)
}

#[tokio::test]
async fn test_each_liquidation_alerts_once() {
    let mut h = harness(MonitorSettings::default());
    h.ledger.push(EventCategory::LiquidationCreated, liquidation_entry(&tx(1), 10, 0, 150, 50));
    h.ledger.push(EventCategory::LiquidationCreated, liquidation_entry(&tx(2), 11, 1, 175, 45));
    h.client.force_update().await.unwrap();

    assert_eq!(h.monitor.check_for_new_liquidations(unit_price).await.unwrap(), 2);
    assert_eq!(h.monitor.check_for_new_liquidations(unit_price).await.unwrap(), 0);

    let messages = h.sink.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].title, "Liquidation Alert 🧙‍♂️!");
    assert_eq!(messages[0].severity, Severity::Info);
    assert!(messages[0].mrkdwn.contains("Sponsor collateralization was 300.00%"));
    assert!(messages[1].mrkdwn.contains("Sponsor collateralization was 388.88%"));
    assert!(messages[0].mrkdwn.contains(&tx(1)));

    h.ledger.push(EventCategory::LiquidationCreated, liquidation_entry(&tx(3), 12, 2, 100, 0));
    h.client.force_update().await.unwrap();

    assert_eq!(h.monitor.check_for_new_liquidations(unit_price).await.unwrap(), 1);
    assert!(h.sink.messages()[2].mrkdwn.contains("Sponsor collateralization was N/A"));
    assert_eq!(h.monitor.alerted_count(EventCategory::LiquidationCreated), 3);
}

#[tokio::test]
async fn test_dispute_alert_references_liquidation() {
    let mut h = harness(MonitorSettings::default());
    h.ledger.push(EventCategory::LiquidationCreated, liquidation_entry(&tx(1), 10, 0, 150, 50));
    h.ledger.push(EventCategory::LiquidationDisputed, dispute_entry(&tx(2), 12, 0, 10));
    h.client.force_update().await.unwrap();

    assert_eq!(h.monitor.check_for_new_dispute_events(unit_price).await.unwrap(), 1);

    let message = &h.sink.messages()[0];
    assert_eq!(message.title, "Dispute Alert 👻!");
    assert_eq!(message.severity, Severity::Warning);
    assert!(message.mrkdwn.contains("initiated dispute against liquidator"));
    assert!(message.mrkdwn.contains("(liquidation 0)"));
    assert!(message.mrkdwn.contains("dispute bond of 10.00 DAI"));
    assert!(message.mrkdwn.contains("Sponsor collateralization at liquidation was 300.00%"));
}

#[tokio::test]
async fn test_settlement_alert_reports_outcome() {
    let mut h = harness(MonitorSettings::default());
    h.ledger.push(EventCategory::DisputeSettled, settlement_entry(&tx(1), 20, 0, false));
    h.ledger.push(EventCategory::DisputeSettled, settlement_entry(&tx(2), 21, 1, true));
    h.client.force_update().await.unwrap();

    assert_eq!(
        h.monitor.check_for_new_dispute_settlement_events(unit_price).await.unwrap(),
        2
    );

    let messages = h.sink.messages();
    assert_eq!(messages[0].title, "Dispute Settlement Alert 👮‍♂️!");
    assert!(messages[0].mrkdwn.contains("has resolved as failed"));
    assert_eq!(messages[0].severity, Severity::Info);
    assert!(messages[1].mrkdwn.contains("has resolved as succeeded"));
    assert_eq!(messages[1].severity, Severity::Warning);
    // No matching liquidation was ingested.
    assert!(!messages[0].mrkdwn.contains("collateralization"));
}

#[tokio::test]
async fn test_failed_dispatch_is_retried_without_duplicates() {
    let mut h = harness(MonitorSettings::default());
    for n in 1..=3 {
        h.ledger.push(EventCategory::LiquidationCreated, liquidation_entry(&tx(n), 10 + n, n, 150, 50));
    }
    h.client.force_update().await.unwrap();
    h.sink.reject_containing(Some(&tx(2)));

    let err = h.monitor.check_for_new_liquidations(unit_price).await.unwrap_err();
    assert!(matches!(
        err,
        MonitorError::Dispatch { category: EventCategory::LiquidationCreated, ref tx_hash, .. } if *tx_hash == tx(2)
    ));
    assert_eq!(h.monitor.alerted_count(EventCategory::LiquidationCreated), 1);
    assert_eq!(h.observer.count(|o| matches!(o, Observation::AlertFailed { .. })), 1);

    h.sink.reject_containing(None);
    assert_eq!(h.monitor.check_for_new_liquidations(unit_price).await.unwrap(), 2);

    let delivered: Vec<bool> = (1..=3)
        .map(|n| h.sink.messages().iter().filter(|m| m.mrkdwn.contains(&tx(n))).count() == 1)
        .collect();
    assert_eq!(delivered, vec![true, true, true]);
}

#[tokio::test]
async fn test_monitored_addresses_change_wording() {
    let settings = MonitorSettings {
        monitored_liquidators: HashSet::from([LIQUIDATOR]),
        monitored_disputers: HashSet::from([DISPUTER]),
        ..MonitorSettings::default()
    };
    let mut h = harness(settings);
    h.ledger.push(EventCategory::LiquidationCreated, liquidation_entry(&tx(1), 10, 0, 150, 50));
    h.ledger.push(EventCategory::LiquidationDisputed, dispute_entry(&tx(2), 12, 0, 10));
    h.client.force_update().await.unwrap();

    h.monitor.check_for_new_liquidations(unit_price).await.unwrap();
    h.monitor.check_for_new_dispute_events(unit_price).await.unwrap();

    let messages = h.sink.messages();
    assert!(messages[0].mrkdwn.contains("(monitored liquidator) initiated liquidation"));
    assert!(messages[1].mrkdwn.contains("(monitored disputer) initiated dispute"));
}

#[tokio::test]
async fn test_run_checks_isolates_failing_category() {
    let mut h = harness(MonitorSettings::default());
    h.ledger.push(EventCategory::LiquidationCreated, liquidation_entry(&tx(1), 10, 0, 150, 50));
    h.ledger.push(EventCategory::LiquidationDisputed, dispute_entry(&tx(2), 12, 0, 10));
    h.ledger.push(EventCategory::DisputeSettled, settlement_entry(&tx(3), 14, 0, true));
    h.client.force_update().await.unwrap();
    h.sink.reject_containing(Some(&tx(2)));

    assert_eq!(run_checks(&mut h.monitor, &unit_price).await, 2);
    assert_eq!(h.monitor.alerted_count(EventCategory::LiquidationDisputed), 0);

    h.sink.reject_containing(None);
    assert_eq!(run_checks(&mut h.monitor, &unit_price).await, 1);
}

#[tokio::test]
async fn test_empty_feed_dispatches_nothing() {
    let mut h = harness(MonitorSettings::default());
    h.client.force_update().await.unwrap();

    assert_eq!(run_checks(&mut h.monitor, &unit_price).await, 0);
    assert!(h.sink.messages().is_empty());
}

#[tokio::test]
async fn test_monitored_sets_only_tag_their_own_role() {
    let settings = MonitorSettings {
        monitored_liquidators: HashSet::from([DISPUTER]),
        monitored_disputers: HashSet::from([LIQUIDATOR]),
        ..MonitorSettings::default()
    };
    let mut h = harness(settings);
    h.ledger.push(EventCategory::LiquidationCreated, liquidation_entry(&tx(1), 10, 0, 150, 50));
    h.ledger.push(EventCategory::LiquidationDisputed, dispute_entry(&tx(2), 12, 0, 10));
    h.ledger.push(EventCategory::DisputeSettled, settlement_entry(&tx(3), 14, 0, true));
    h.client.force_update().await.unwrap();

    assert_eq!(run_checks(&mut h.monitor, &unit_price).await, 3);

    for message in h.sink.messages() {
        assert!(!message.mrkdwn.contains("(monitored"), "unexpected tag in {}", message.mrkdwn);
    }
}
