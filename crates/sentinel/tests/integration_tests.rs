//! End-to-end monitor scenarios over real stores.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use tillguard_accounting::{Ledger, NewClosure};
use tillguard_core::{InMemoryAuditSink, ProductId};
use tillguard_ops::{
    CashStore, ConnectivityInfo, InventoryStore, LowStockItem, MovementKind, ProbeError, Product,
    SaleItem, SalesStore, StaticProbe,
};
use tillguard_sentinel::{AlertType, HealthStatus, Sentinel, SentinelConfig};

struct Fixture {
    sentinel: Sentinel,
    ledger: Arc<Ledger>,
    sales: Arc<SalesStore>,
    cash: Arc<CashStore>,
    inventory: Arc<InventoryStore>,
    probe: Arc<StaticProbe>,
    audit: Arc<InMemoryAuditSink>,
}

fn fixture() -> Fixture {
    let audit = Arc::new(InMemoryAuditSink::default());
    let ledger = Arc::new(Ledger::new(audit.clone()));
    let sales = Arc::new(SalesStore::new(audit.clone()));
    let cash = Arc::new(CashStore::new(audit.clone()));
    let inventory = Arc::new(InventoryStore::new());
    let probe = Arc::new(StaticProbe::new());
    let sentinel = Sentinel::new(
        ledger.clone(),
        sales.clone(),
        cash.clone(),
        inventory.clone(),
        probe.clone(),
        audit.clone(),
        SentinelConfig::default(),
    );
    Fixture {
        sentinel,
        ledger,
        sales,
        cash,
        inventory,
        probe,
        audit,
    }
}

fn sale_item(price: f64, qty: f64) -> SaleItem {
    SaleItem {
        product_id: ProductId::new(),
        name: "widget".to_string(),
        price,
        qty,
    }
}

#[test]
fn healthy_system_is_green_with_system_ok() {
    let f = fixture();
    let snapshot = f.sentinel.run_health_check();

    assert_eq!(snapshot.status, HealthStatus::Green);
    assert!(snapshot.last_check.is_some());
    assert_eq!(snapshot.alerts.len(), 1);
    assert_eq!(snapshot.alerts[0].alert_type, AlertType::SystemOk);
}

#[test]
fn corrupted_closure_turns_health_red() {
    let f = fixture();
    let closure = f
        .ledger
        .close_period(NewClosure {
            period_start: "2025-05-01".parse().unwrap(),
            period_end: "2025-05-31".parse().unwrap(),
            accountant_name: "R. Fuentes".to_string(),
            notes: String::new(),
            signature: None,
        })
        .unwrap();

    let mut corrupted = closure.clone();
    corrupted.accountant_name = "Someone Else".to_string();
    f.ledger.periods().overwrite_closure(corrupted);

    let snapshot = f.sentinel.run_health_check();
    assert_eq!(snapshot.status, HealthStatus::Red);
    let alert = snapshot
        .alerts
        .iter()
        .find(|a| a.alert_type == AlertType::DataCorruption)
        .unwrap();
    assert_eq!(alert.details["closure_ids"][0], closure.id.to_string());
    assert_eq!(f.audit.find("accounting", "period_tamper").len(), 1);
}

#[test]
fn sale_total_mismatch_is_auto_corrected() {
    let f = fixture();
    // Items sum to 95 but the header says 100.
    let sale = f.sales.insert(vec![sale_item(19.0, 5.0)], 100.0);

    let snapshot = f.sentinel.run_health_check();

    assert_eq!(f.sales.get(sale.id).unwrap().total, 95.0);
    assert_eq!(snapshot.status, HealthStatus::Green);
    assert!(
        !snapshot
            .alerts
            .iter()
            .any(|a| a.alert_type == AlertType::SalesMismatch)
    );
    assert_eq!(snapshot.last_corrections.len(), 1);
    assert_eq!(snapshot.last_corrections[0].before, 100.0);
    assert_eq!(snapshot.last_corrections[0].after, 95.0);

    let audited = f.audit.find("sale", "auto_correct");
    assert_eq!(audited.len(), 1);
    assert_eq!(audited[0].details["before"], 100.0);
    assert_eq!(audited[0].details["after"], 95.0);
}

#[test]
fn disabled_auto_correct_leaves_store_untouched() {
    let f = fixture();
    let sale = f.sales.insert(vec![sale_item(19.0, 5.0)], 100.0);
    f.sentinel.set_auto_correct_enabled(false);

    let snapshot = f.sentinel.run_health_check();

    assert_eq!(f.sales.get(sale.id).unwrap().total, 100.0);
    assert!(snapshot.last_corrections.is_empty());
    assert!(
        snapshot
            .alerts
            .iter()
            .any(|a| a.alert_type == AlertType::SalesMismatch)
    );
    // Discrepancy ratio 5/95 exceeds the red sales threshold.
    let human = snapshot
        .alerts
        .iter()
        .find(|a| a.alert_type == AlertType::HumanFactorSignal)
        .unwrap();
    assert_eq!(human.details["stage"], "high");
    assert_eq!(snapshot.status, HealthStatus::Yellow);
    assert!(f.audit.find("sale", "auto_correct").is_empty());
}

#[test]
fn cash_drift_is_reconciled_from_movements() {
    let f = fixture();
    let session = f.cash.open_session(100.0);
    f.cash.record_movement(session.id, MovementKind::Sale, 50.0);
    f.cash.record_movement(session.id, MovementKind::Refund, 10.0);
    f.cash.record_movement(session.id, MovementKind::CashOut, 5.0);
    // Stored expectation still 100; movements say 135.

    let snapshot = f.sentinel.run_health_check();

    assert_eq!(f.cash.session(session.id).unwrap().expected_cash, 135.0);
    assert_eq!(snapshot.status, HealthStatus::Green);
    assert_eq!(f.audit.find("cash_session", "auto_correct").len(), 1);
}

#[test]
fn counted_variance_raises_discrepancy_alert() {
    let f = fixture();
    let session = f.cash.open_session(200.0);
    f.cash.record_variance(session.id, -12.5, None);

    let snapshot = f.sentinel.run_health_check();

    let alert = snapshot
        .alerts
        .iter()
        .find(|a| a.alert_type == AlertType::CashDiscrepancy)
        .unwrap();
    assert_eq!(alert.details["variances"][0]["variance"], -12.5);
    assert_eq!(snapshot.status, HealthStatus::Yellow);
}

#[test]
fn negative_stock_is_critical_until_acknowledged() {
    let f = fixture();
    let product = Product {
        id: ProductId::new(),
        name: "flour".to_string(),
        stock: 3.0,
        min_stock: 5.0,
    };
    f.inventory.upsert(product.clone());
    f.inventory.adjust(product.id, -5.0, "sale");

    let snapshot = f.sentinel.run_health_check();
    assert_eq!(snapshot.status, HealthStatus::Red);
    let alert = snapshot
        .alerts
        .iter()
        .find(|a| a.alert_type == AlertType::InventoryNegative)
        .unwrap();

    assert!(f.sentinel.acknowledge_alert(alert.id));
    assert_eq!(f.sentinel.snapshot().status, HealthStatus::Green);
}

#[test]
fn silent_probe_failures_leave_health_untouched() {
    let f = fixture();
    f.probe.fail_low_stock(ProbeError::Http(503));
    f.probe.fail_expiring_lots(ProbeError::Http(404));
    f.probe.fail_connectivity(ProbeError::Offline);
    f.probe.fail_last_backup(ProbeError::Http(401));

    let snapshot = f.sentinel.run_health_check();
    assert_eq!(snapshot.status, HealthStatus::Green);
    assert_eq!(snapshot.alerts.len(), 1);
    assert_eq!(snapshot.alerts[0].alert_type, AlertType::SystemOk);
}

#[test]
fn prolonged_offline_and_stale_backup_raise_warnings() {
    let f = fixture();
    f.probe.set_connectivity(ConnectivityInfo {
        online: false,
        last_online: Some(Utc::now() - chrono::Duration::hours(2)),
    });
    f.probe
        .set_last_backup(Some(Utc::now() - chrono::Duration::days(8)));

    let snapshot = f.sentinel.run_health_check();

    assert!(
        snapshot
            .alerts
            .iter()
            .any(|a| a.alert_type == AlertType::OfflineProlonged)
    );
    assert!(
        snapshot
            .alerts
            .iter()
            .any(|a| a.alert_type == AlertType::BackupOverdue)
    );
    assert_eq!(snapshot.status, HealthStatus::Yellow);
}

#[test]
fn low_stock_and_expiring_lots_surface_as_warnings() {
    let f = fixture();
    f.probe.set_low_stock(vec![LowStockItem {
        product_id: ProductId::new(),
        name: "sugar".to_string(),
        stock: 1.0,
        min_stock: 10.0,
    }]);

    let snapshot = f.sentinel.run_health_check();
    let alert = snapshot
        .alerts
        .iter()
        .find(|a| a.alert_type == AlertType::LowStock)
        .unwrap();
    assert_eq!(alert.details["products"][0], "sugar");
    assert_eq!(snapshot.status, HealthStatus::Yellow);

    // Restocked: next pass clears the alert.
    f.probe.set_low_stock(Vec::new());
    let snapshot = f.sentinel.run_health_check();
    assert!(
        !snapshot
            .alerts
            .iter()
            .any(|a| a.alert_type == AlertType::LowStock)
    );
}

#[test]
fn add_alert_replaces_by_type() {
    let f = fixture();
    f.sentinel
        .add_alert(AlertType::LowStock, "first", json!({}));
    f.sentinel
        .add_alert(AlertType::LowStock, "second", json!({}));

    let snapshot = f.sentinel.snapshot();
    let low: Vec<_> = snapshot
        .alerts
        .iter()
        .filter(|a| a.alert_type == AlertType::LowStock)
        .collect();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].message, "second");
}

#[test]
fn subscribers_get_snapshots_until_unsubscribed() {
    let f = fixture();
    let seen: Arc<Mutex<Vec<HealthStatus>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let id = f.sentinel.subscribe(move |snapshot| {
        sink.lock().unwrap().push(snapshot.status);
    });
    // Immediate snapshot on subscribe.
    assert_eq!(seen.lock().unwrap().len(), 1);

    f.sentinel
        .add_alert(AlertType::DataCorruption, "tamper", json!({}));
    assert_eq!(seen.lock().unwrap().len(), 2);
    assert_eq!(seen.lock().unwrap()[1], HealthStatus::Red);

    assert!(f.sentinel.unsubscribe(id));
    f.sentinel.clear_alerts(None);
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn subscribers_see_each_alert_as_the_pass_raises_it() {
    let f = fixture();
    // Mismatched sale with auto-correct off keeps the alert alive mid-pass.
    f.sales.insert(vec![sale_item(19.0, 5.0)], 100.0);
    f.sentinel.set_auto_correct_enabled(false);

    let seen: Arc<Mutex<Vec<(Option<AlertType>, bool)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    f.sentinel.subscribe(move |snapshot| {
        let mismatch = snapshot
            .alerts
            .iter()
            .find(|a| a.alert_type == AlertType::SalesMismatch)
            .map(|a| a.alert_type);
        sink.lock()
            .unwrap()
            .push((mismatch, snapshot.last_check.is_some()));
    });

    f.sentinel.run_health_check();

    let seen = seen.lock().unwrap();
    // Initial snapshot on subscribe, then one per registry mutation during
    // the pass, then the end-of-pass broadcast.
    assert!(seen.len() > 2, "expected mid-pass snapshots, got {}", seen.len());
    // The mismatch alert reached a subscriber before the pass finished
    // (last_check is only stamped at the end).
    assert!(
        seen.iter()
            .any(|(mismatch, finished)| mismatch.is_some() && !finished)
    );
}

#[test]
fn start_and_stop_round_trip_the_running_state() {
    let f = fixture();
    assert!(!f.sentinel.is_running());

    assert!(f.sentinel.start_every(Duration::from_secs(3600)));
    assert!(f.sentinel.is_running());
    // Second start is a no-op while the loop is alive.
    assert!(!f.sentinel.start());

    // The loop runs an initial pass on start.
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while f.sentinel.snapshot().last_check.is_none() {
        assert!(std::time::Instant::now() < deadline, "initial pass never ran");
        std::thread::sleep(Duration::from_millis(10));
    }

    assert!(f.sentinel.stop());
    assert!(!f.sentinel.is_running());
    assert!(!f.sentinel.stop());

    // No-arg start falls back to the configured interval.
    assert!(f.sentinel.start());
    assert!(f.sentinel.stop());
}

#[test]
fn ledger_books_feed_the_accounting_check() {
    let f = fixture();
    f.ledger
        .record_sale(tillguard_accounting::RecordSale {
            sale_reference: "S-1".to_string(),
            subtotal: 100.0,
            tax: 15.0,
            total: 115.0,
            payment: tillguard_accounting::PaymentMethod::Cash,
            on_credit: false,
        })
        .unwrap();

    let snapshot = f.sentinel.run_health_check();
    assert_eq!(snapshot.status, HealthStatus::Green);
    assert!(
        !snapshot
            .alerts
            .iter()
            .any(|a| a.alert_type == AlertType::AccountingImbalance
                || a.alert_type == AlertType::JournalImbalance)
    );
}

#[test]
fn diagnostic_report_carries_counts_and_health() {
    let f = fixture();
    f.sales.insert(vec![sale_item(10.0, 1.0)], 10.0);
    f.sentinel.run_health_check();

    let report = f.sentinel.generate_diagnostic_report();
    assert_eq!(report["health"], "green");
    assert_eq!(report["stores"]["sales"], 1);
    assert_eq!(report["auto_correct_enabled"], true);
    assert!(report["probe"]["connectivity"]["online"].as_bool().unwrap());
}
