//! The integrity sentinel: ordered checks, auto-correction, scheduling,
//! and subscriber notification.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, mpsc};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use tillguard_accounting::Ledger;
use tillguard_core::{
    AlertId, AuditRecord, AuditSink, ClosureId, SaleId, SessionId, SubscriptionId, approx_eq, emit,
    round2,
};
use tillguard_ops::{CashStore, InventoryStore, OpsProbe, ProbeError, SalesStore};

use crate::alert::{Alert, AlertRegistry, AlertType, HealthStatus, Severity};

/// Number of corrections retained on the snapshot.
const RETAINED_CORRECTIONS: usize = 10;

/// Ratio buckets for the human-factor advisory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalThresholds {
    /// Ratio at or below this is normal.
    pub green: f64,
    /// Ratio at or below this (but above green) warrants attention.
    pub yellow: f64,
}

impl SignalThresholds {
    /// A ratio exactly at a threshold escalates into that bucket.
    pub fn stage(&self, ratio: f64) -> SignalStage {
        if ratio >= self.yellow {
            SignalStage::Red
        } else if ratio >= self.green {
            SignalStage::Yellow
        } else {
            SignalStage::Green
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStage {
    Green,
    Yellow,
    Red,
}

impl SignalStage {
    pub fn label(self) -> &'static str {
        match self {
            SignalStage::Green => "normal",
            SignalStage::Yellow => "elevated",
            SignalStage::Red => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Default pass interval for the scheduler.
    pub interval: Duration,
    pub sales_signal: SignalThresholds,
    pub cash_signal: SignalThresholds,
    /// Offline longer than this raises an alert.
    pub offline_after: Duration,
    /// No backup newer than this raises an alert.
    pub backup_overdue_after: Duration,
    /// Horizon passed to the expiring-lots lookup.
    pub low_stock_window_days: u32,
    /// Bound on correction/re-check rounds within one pass.
    pub max_recheck_rounds: u32,
    /// Initial state of the auto-correction toggle.
    pub auto_correct: bool,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            sales_signal: SignalThresholds {
                green: 0.01,
                yellow: 0.05,
            },
            cash_signal: SignalThresholds {
                green: 0.005,
                yellow: 0.02,
            },
            offline_after: Duration::from_secs(60 * 60),
            backup_overdue_after: Duration::from_secs(7 * 24 * 60 * 60),
            low_stock_window_days: 7,
            max_recheck_rounds: 2,
            auto_correct: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum CorrectionTarget {
    Sale(SaleId),
    CashSession(SessionId),
}

/// One applied auto-correction, with the overwritten value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub target: CorrectionTarget,
    pub before: f64,
    pub after: f64,
    pub applied_at: DateTime<Utc>,
}

/// Full monitor state handed to subscribers and callers.
#[derive(Debug, Clone, Serialize)]
pub struct SentinelSnapshot {
    pub status: HealthStatus,
    pub alerts: Vec<Alert>,
    pub last_check: Option<DateTime<Utc>>,
    pub last_corrections: Vec<Correction>,
    pub critical_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
}

type SnapshotCallback = Box<dyn Fn(&SentinelSnapshot) + Send + Sync>;

struct RunnerHandle {
    shutdown: mpsc::Sender<()>,
    join: thread::JoinHandle<()>,
}

#[derive(Debug, Clone, Copy, Default)]
struct CheckOutcome {
    dirty: bool,
    ratio: f64,
}

/// Continuous integrity monitor over the ledger and operational stores.
///
/// Cheap to clone; clones share all state including the scheduler handle.
#[derive(Clone)]
pub struct Sentinel {
    ledger: Arc<Ledger>,
    sales: Arc<SalesStore>,
    cash: Arc<CashStore>,
    inventory: Arc<InventoryStore>,
    probe: Arc<dyn OpsProbe>,
    audit: Arc<dyn AuditSink>,
    config: SentinelConfig,
    registry: Arc<AlertRegistry>,
    subscribers: Arc<RwLock<HashMap<SubscriptionId, SnapshotCallback>>>,
    last_check: Arc<RwLock<Option<DateTime<Utc>>>>,
    corrections: Arc<RwLock<VecDeque<Correction>>>,
    auto_correct_enabled: Arc<AtomicBool>,
    runner: Arc<Mutex<Option<RunnerHandle>>>,
}

impl Sentinel {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ledger: Arc<Ledger>,
        sales: Arc<SalesStore>,
        cash: Arc<CashStore>,
        inventory: Arc<InventoryStore>,
        probe: Arc<dyn OpsProbe>,
        audit: Arc<dyn AuditSink>,
        config: SentinelConfig,
    ) -> Self {
        let auto_correct = config.auto_correct;
        Self {
            ledger,
            sales,
            cash,
            inventory,
            probe,
            audit,
            config,
            registry: Arc::new(AlertRegistry::new()),
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            last_check: Arc::new(RwLock::new(None)),
            corrections: Arc::new(RwLock::new(VecDeque::new())),
            auto_correct_enabled: Arc::new(AtomicBool::new(auto_correct)),
            runner: Arc::new(Mutex::new(None)),
        }
    }

    // Subscriptions

    /// Register a callback. It immediately receives the current snapshot,
    /// then a fresh one synchronously after every registry mutation.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SentinelSnapshot) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        callback(&self.snapshot());
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Box::new(callback));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
            .is_some()
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        let subscribers = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
        for callback in subscribers.values() {
            callback(&snapshot);
        }
    }

    // Alert surface

    pub fn add_alert(
        &self,
        alert_type: AlertType,
        message: impl Into<String>,
        details: JsonValue,
    ) -> Alert {
        let alert = self.registry.raise(alert_type, message, details);
        self.notify();
        alert
    }

    pub fn acknowledge_alert(&self, id: AlertId) -> bool {
        let changed = self.registry.acknowledge(id);
        if changed {
            self.notify();
        }
        changed
    }

    pub fn clear_alerts(&self, severity: Option<Severity>) {
        self.registry.clear(severity);
        self.notify();
    }

    pub fn remove_alert(&self, alert_type: AlertType) -> bool {
        let removed = self.registry.remove(alert_type);
        if removed {
            self.notify();
        }
        removed
    }

    pub fn health(&self) -> HealthStatus {
        self.registry.health()
    }

    /// Raise from inside a pass. Subscribers see each mutation as it lands,
    /// not just the end-of-pass snapshot.
    fn raise_alert(&self, alert_type: AlertType, message: impl Into<String>, details: JsonValue) {
        self.registry.raise(alert_type, message, details);
        self.notify();
    }

    fn clear_alert(&self, alert_type: AlertType) {
        if self.registry.remove(alert_type) {
            self.notify();
        }
    }

    // Auto-correction toggle

    pub fn auto_correct_enabled(&self) -> bool {
        self.auto_correct_enabled.load(Ordering::Relaxed)
    }

    pub fn set_auto_correct_enabled(&self, enabled: bool) {
        self.auto_correct_enabled.store(enabled, Ordering::Relaxed);
    }

    // The pass

    /// Run one full ordered pass and return the resulting snapshot.
    pub fn run_health_check(&self) -> SentinelSnapshot {
        self.check_accounting();
        self.check_journal();
        let mut sales = self.check_sales();
        let mut cash = self.check_cash();

        if (sales.dirty || cash.dirty) && self.auto_correct_enabled() {
            for _ in 0..self.config.max_recheck_rounds {
                if self.auto_correct().is_empty() {
                    break;
                }
                sales = self.check_sales();
                cash = self.check_cash();
                if !sales.dirty && !cash.dirty {
                    break;
                }
            }
        }
        self.update_human_factor(sales.ratio, cash.ratio);

        self.check_inventory();
        self.check_low_stock();
        self.check_expiring_lots();
        self.check_connectivity();
        self.check_backup();
        self.update_system_ok();

        *self.last_check.write().unwrap_or_else(|e| e.into_inner()) = Some(Utc::now());
        self.notify();
        self.snapshot()
    }

    /// Trial balance plus the closure tamper sweep.
    fn check_accounting(&self) {
        let tb = self.ledger.trial_balance();
        if tb.is_balanced() {
            self.clear_alert(AlertType::AccountingImbalance);
        } else {
            tracing::error!(difference = tb.difference(), "trial balance out of balance");
            self.raise_alert(
                AlertType::AccountingImbalance,
                format!("Trial balance off by {:.2}", tb.difference()),
                json!({
                    "total_debit": tb.total_debit,
                    "total_credit": tb.total_credit,
                    "difference": tb.difference(),
                }),
            );
        }
        self.verify_closures();
    }

    /// Closure tamper sweep; tampering raises a critical alert.
    pub fn verify_closures(&self) -> Vec<ClosureId> {
        let tampered = self.ledger.verify_closures();
        if tampered.is_empty() {
            self.clear_alert(AlertType::DataCorruption);
        } else {
            let ids: Vec<String> = tampered.iter().map(|id| id.to_string()).collect();
            self.raise_alert(
                AlertType::DataCorruption,
                format!("{} period closure(s) failed hash verification", ids.len()),
                json!({ "closure_ids": ids }),
            );
        }
        tampered
    }

    /// Per-entry line sums must match within tolerance.
    fn check_journal(&self) {
        let mut offenders = Vec::new();
        for entry in self.ledger.entries() {
            let lines = self.ledger.lines_of(entry.id);
            let debit: f64 = lines.iter().map(|l| l.debit).sum();
            let credit: f64 = lines.iter().map(|l| l.credit).sum();
            if !approx_eq(debit, credit) {
                offenders.push(json!({
                    "entry_id": entry.id.to_string(),
                    "debit": round2(debit),
                    "credit": round2(credit),
                }));
            }
        }
        if offenders.is_empty() {
            self.clear_alert(AlertType::JournalImbalance);
        } else {
            self.raise_alert(
                AlertType::JournalImbalance,
                format!("{} journal entr(ies) with unbalanced lines", offenders.len()),
                json!({ "entries": offenders }),
            );
        }
    }

    /// Stored sale totals vs recomputed item sums.
    fn check_sales(&self) -> CheckOutcome {
        let mut mismatched = Vec::new();
        let mut discrepancy = 0.0;
        let mut baseline = 0.0;
        for sale in self.sales.list_active() {
            let computed = sale.items_total();
            baseline += computed;
            let diff = sale.total - computed;
            if !approx_eq(sale.total, computed) {
                discrepancy += diff.abs();
                mismatched.push(json!({
                    "sale_id": sale.id.to_string(),
                    "stored": sale.total,
                    "computed": computed,
                }));
            }
        }

        if mismatched.is_empty() {
            self.clear_alert(AlertType::SalesMismatch);
            return CheckOutcome::default();
        }
        self.raise_alert(
            AlertType::SalesMismatch,
            format!("{} sale(s) disagree with their item sums", mismatched.len()),
            json!({ "sales": mismatched, "total_discrepancy": round2(discrepancy) }),
        );
        CheckOutcome {
            dirty: true,
            ratio: discrepancy / baseline.max(1.0),
        }
    }

    /// Open-session expectation drift and counted variances.
    fn check_cash(&self) -> CheckOutcome {
        let mut drifted = Vec::new();
        let mut discrepancy = 0.0;
        let mut baseline = 0.0;
        for session in self.cash.open_sessions() {
            let Some(expected) = self.cash.expected_from_movements(session.id) else {
                continue;
            };
            baseline += expected.abs();
            let diff = session.expected_cash - expected;
            if !approx_eq(session.expected_cash, expected) {
                discrepancy += diff.abs();
                drifted.push(json!({
                    "session_id": session.id.to_string(),
                    "stored": session.expected_cash,
                    "computed": expected,
                }));
            }
        }

        let large_variances: Vec<JsonValue> = self
            .cash
            .variances()
            .iter()
            .filter(|v| !approx_eq(v.variance, 0.0))
            .map(|v| {
                discrepancy += v.variance.abs();
                json!({ "session_id": v.session_id.to_string(), "variance": v.variance })
            })
            .collect();

        if large_variances.is_empty() {
            self.clear_alert(AlertType::CashDiscrepancy);
        } else {
            self.raise_alert(
                AlertType::CashDiscrepancy,
                format!("{} cash count(s) differ from expected", large_variances.len()),
                json!({ "variances": large_variances }),
            );
        }

        if drifted.is_empty() {
            self.clear_alert(AlertType::CashSessionDrift);
            return CheckOutcome {
                dirty: false,
                ratio: discrepancy / baseline.max(1.0),
            };
        }
        self.raise_alert(
            AlertType::CashSessionDrift,
            format!("{} open session(s) drifted from movement history", drifted.len()),
            json!({ "sessions": drifted }),
        );
        CheckOutcome {
            dirty: true,
            ratio: discrepancy / baseline.max(1.0),
        }
    }

    /// Advisory only: discrepancy-to-volume ratio bucketed per source.
    fn update_human_factor(&self, sales_ratio: f64, cash_ratio: f64) {
        if sales_ratio == 0.0 && cash_ratio == 0.0 {
            self.clear_alert(AlertType::HumanFactorSignal);
            return;
        }
        let sales_stage = self.config.sales_signal.stage(sales_ratio);
        let cash_stage = self.config.cash_signal.stage(cash_ratio);
        let stage = sales_stage.max(cash_stage);
        self.raise_alert(
            AlertType::HumanFactorSignal,
            format!("Discrepancy pattern is {}", stage.label()),
            json!({
                "sales_ratio": sales_ratio,
                "cash_ratio": cash_ratio,
                "stage": stage.label(),
            }),
        );
    }

    /// Negative stock and movements pointing at missing products.
    fn check_inventory(&self) {
        let negative = self.inventory.negative_stock();
        let orphans = self.inventory.orphan_movements();
        if negative.is_empty() && orphans.is_empty() {
            self.clear_alert(AlertType::InventoryNegative);
            return;
        }
        let names: Vec<&str> = negative.iter().map(|p| p.name.as_str()).collect();
        self.raise_alert(
            AlertType::InventoryNegative,
            format!(
                "{} product(s) below zero, {} orphan movement(s)",
                negative.len(),
                orphans.len()
            ),
            json!({ "products": names, "orphan_movements": orphans.len() }),
        );
    }

    fn check_low_stock(&self) {
        match self.probe.low_stock() {
            Ok(items) if items.is_empty() => {
                self.clear_alert(AlertType::LowStock);
            }
            Ok(items) => {
                let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
                self.raise_alert(
                    AlertType::LowStock,
                    format!("{} product(s) at or below minimum stock", items.len()),
                    json!({ "products": names }),
                );
            }
            Err(e) => self.log_probe_failure("low_stock", &e),
        }
    }

    fn check_expiring_lots(&self) {
        match self.probe.expiring_lots(self.config.low_stock_window_days) {
            Ok(lots) if lots.is_empty() => {
                self.clear_alert(AlertType::ExpiringLots);
            }
            Ok(lots) => {
                let entries: Vec<JsonValue> = lots
                    .iter()
                    .map(|l| json!({ "name": l.name, "lot": l.lot, "expires_on": l.expires_on }))
                    .collect();
                self.raise_alert(
                    AlertType::ExpiringLots,
                    format!(
                        "{} lot(s) expiring within {} days",
                        lots.len(),
                        self.config.low_stock_window_days
                    ),
                    json!({ "lots": entries }),
                );
            }
            Err(e) => self.log_probe_failure("expiring_lots", &e),
        }
    }

    fn check_connectivity(&self) {
        match self.probe.connectivity() {
            Ok(info) if info.online => {
                self.clear_alert(AlertType::OfflineProlonged);
            }
            Ok(info) => {
                let prolonged = match info.last_online {
                    Some(at) => {
                        let elapsed = Utc::now().signed_duration_since(at);
                        elapsed.num_seconds() >= self.config.offline_after.as_secs() as i64
                    }
                    None => true,
                };
                if prolonged {
                    self.raise_alert(
                        AlertType::OfflineProlonged,
                        "Connection has been down past the grace window",
                        json!({ "last_online": info.last_online }),
                    );
                } else {
                    self.clear_alert(AlertType::OfflineProlonged);
                }
            }
            Err(e) => self.log_probe_failure("connectivity", &e),
        }
    }

    fn check_backup(&self) {
        match self.probe.last_backup() {
            Ok(Some(at)) => {
                let elapsed = Utc::now().signed_duration_since(at);
                if elapsed.num_seconds() >= self.config.backup_overdue_after.as_secs() as i64 {
                    self.raise_alert(
                        AlertType::BackupOverdue,
                        "Last backup is past the overdue window",
                        json!({ "last_backup": at }),
                    );
                } else {
                    self.clear_alert(AlertType::BackupOverdue);
                }
            }
            Ok(None) => {
                self.raise_alert(
                    AlertType::BackupOverdue,
                    "No backup has ever been recorded",
                    json!({ "last_backup": null }),
                );
            }
            Err(e) => self.log_probe_failure("last_backup", &e),
        }
    }

    /// A live `system_ok` means no alert above info level.
    fn update_system_ok(&self) {
        let noisy = self
            .registry
            .sorted()
            .iter()
            .any(|a| a.severity != Severity::Info && a.alert_type != AlertType::SystemOk);
        if noisy {
            self.clear_alert(AlertType::SystemOk);
        } else if self.registry.get(AlertType::SystemOk).is_none() {
            self.raise_alert(AlertType::SystemOk, "All checks passed", json!({}));
        }
    }

    fn log_probe_failure(&self, lookup: &str, error: &ProbeError) {
        if error.is_silent() {
            tracing::debug!(lookup, %error, "probe lookup degraded");
        } else {
            tracing::warn!(lookup, %error, "probe lookup failed");
        }
    }

    // Correction

    /// Recompute derivable stored values and overwrite the ones off by more
    /// than the tolerance. Every overwrite is audited by the owning store.
    pub fn auto_correct(&self) -> Vec<Correction> {
        let mut applied = Vec::new();

        for session in self.cash.open_sessions() {
            let Some(expected) = self.cash.expected_from_movements(session.id) else {
                continue;
            };
            if !approx_eq(expected, session.expected_cash)
                && self
                    .cash
                    .set_expected_cash(session.id, expected, "movement reconciliation")
            {
                applied.push(Correction {
                    target: CorrectionTarget::CashSession(session.id),
                    before: session.expected_cash,
                    after: expected,
                    applied_at: Utc::now(),
                });
            }
        }

        for sale in self.sales.list_active() {
            let computed = sale.items_total();
            if !approx_eq(computed, sale.total)
                && self.sales.set_total(sale.id, computed, "item sum recomputation")
            {
                applied.push(Correction {
                    target: CorrectionTarget::Sale(sale.id),
                    before: sale.total,
                    after: computed,
                    applied_at: Utc::now(),
                });
            }
        }

        if !applied.is_empty() {
            emit(
                self.audit.as_ref(),
                AuditRecord::new(
                    "sentinel",
                    "pass",
                    "auto_correct",
                    json!({ "corrections": applied.len() }),
                ),
            );
            let mut log = self.corrections.write().unwrap_or_else(|e| e.into_inner());
            for correction in &applied {
                log.push_back(correction.clone());
            }
            while log.len() > RETAINED_CORRECTIONS {
                log.pop_front();
            }
        }
        applied
    }

    // Scheduling

    /// Start the background pass loop at the configured interval. Runs one
    /// pass immediately. Returns false when already running.
    pub fn start(&self) -> bool {
        self.start_every(self.config.interval)
    }

    /// Start the loop with an explicit interval instead of the configured
    /// one.
    pub fn start_every(&self, interval: Duration) -> bool {
        let mut runner = self.runner.lock().unwrap_or_else(|e| e.into_inner());
        if runner.is_some() {
            return false;
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let worker = self.clone();
        let join = thread::Builder::new()
            .name("sentinel".to_string())
            .spawn(move || {
                tracing::info!(interval_secs = interval.as_secs(), "sentinel loop started");
                worker.run_health_check();
                loop {
                    match shutdown_rx.recv_timeout(interval) {
                        Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            worker.run_health_check();
                        }
                    }
                }
                tracing::info!("sentinel loop stopped");
            })
            .expect("failed to spawn sentinel thread");

        *runner = Some(RunnerHandle {
            shutdown: shutdown_tx,
            join,
        });
        true
    }

    /// Stop the loop, letting any in-flight pass finish. Returns false when
    /// not running.
    pub fn stop(&self) -> bool {
        let handle = {
            let mut runner = self.runner.lock().unwrap_or_else(|e| e.into_inner());
            runner.take()
        };
        match handle {
            Some(handle) => {
                let _ = handle.shutdown.send(());
                let _ = handle.join.join();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.runner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    // Reads

    pub fn snapshot(&self) -> SentinelSnapshot {
        let alerts = self.registry.sorted();
        SentinelSnapshot {
            status: self.registry.health(),
            critical_count: self.registry.count_by(Severity::Critical),
            warning_count: self.registry.count_by(Severity::Warning),
            info_count: self.registry.count_by(Severity::Info),
            alerts,
            last_check: *self.last_check.read().unwrap_or_else(|e| e.into_inner()),
            last_corrections: self
                .corrections
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .cloned()
                .collect(),
        }
    }

    /// One-shot JSON report of everything the monitor can see.
    pub fn generate_diagnostic_report(&self) -> JsonValue {
        let snapshot = self.snapshot();
        let connectivity = match self.probe.connectivity() {
            Ok(info) => json!({ "online": info.online, "last_online": info.last_online }),
            Err(e) => json!({ "error": e.to_string() }),
        };
        let last_backup = match self.probe.last_backup() {
            Ok(at) => json!(at),
            Err(e) => json!({ "error": e.to_string() }),
        };
        json!({
            "generated_at": Utc::now(),
            "health": snapshot.status,
            "alerts": snapshot.alerts,
            "corrections": snapshot.last_corrections,
            "auto_correct_enabled": self.auto_correct_enabled(),
            "stores": {
                "journal_entries": self.ledger.entries().len(),
                "closures": self.ledger.closures().len(),
                "sales": self.sales.count(),
                "cash_sessions": self.cash.count(),
                "products": self.inventory.count(),
            },
            "probe": {
                "connectivity": connectivity,
                "last_backup": last_backup,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_escalates_at_each_threshold() {
        let thresholds = SignalThresholds {
            green: 0.01,
            yellow: 0.05,
        };
        assert_eq!(thresholds.stage(0.0), SignalStage::Green);
        assert_eq!(thresholds.stage(0.009), SignalStage::Green);
        assert_eq!(thresholds.stage(0.01), SignalStage::Yellow);
        assert_eq!(thresholds.stage(0.049), SignalStage::Yellow);
        assert_eq!(thresholds.stage(0.05), SignalStage::Red);
        assert_eq!(thresholds.stage(0.2), SignalStage::Red);
    }

    #[test]
    fn stage_ordering_picks_the_worse_signal() {
        assert_eq!(SignalStage::Green.max(SignalStage::Red), SignalStage::Red);
        assert_eq!(
            SignalStage::Yellow.max(SignalStage::Green),
            SignalStage::Yellow
        );
        assert_eq!(SignalStage::Red.label(), "high");
    }

    #[test]
    fn default_config_matches_operating_values() {
        let config = SentinelConfig::default();
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.sales_signal.green, 0.01);
        assert_eq!(config.sales_signal.yellow, 0.05);
        assert_eq!(config.cash_signal.green, 0.005);
        assert_eq!(config.cash_signal.yellow, 0.02);
        assert_eq!(config.max_recheck_rounds, 2);
        assert!(config.auto_correct);
    }
}
