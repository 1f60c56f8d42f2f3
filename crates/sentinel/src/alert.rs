//! Alert model: typed alerts with a static priority table and the
//! replace-by-type registry behind the health status.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use tillguard_core::AlertId;

/// Alert classes, one registry slot each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    AccountingImbalance,
    DataCorruption,
    JournalImbalance,
    InventoryNegative,
    HumanFactorSignal,
    CashDiscrepancy,
    SalesMismatch,
    CashSessionDrift,
    OfflineProlonged,
    LowStock,
    ExpiringLots,
    BackupOverdue,
    SystemOk,
}

impl AlertType {
    /// Static priority table. Higher means more urgent.
    pub fn priority(self) -> u8 {
        match self {
            AlertType::AccountingImbalance => 100,
            AlertType::DataCorruption => 100,
            AlertType::JournalImbalance => 90,
            AlertType::InventoryNegative => 90,
            AlertType::HumanFactorSignal => 80,
            AlertType::CashDiscrepancy => 70,
            AlertType::SalesMismatch => 65,
            AlertType::CashSessionDrift => 60,
            AlertType::OfflineProlonged => 60,
            AlertType::LowStock => 50,
            AlertType::ExpiringLots => 45,
            AlertType::BackupOverdue => 40,
            AlertType::SystemOk => 0,
        }
    }

    /// Severity derives from priority, never set independently.
    pub fn severity(self) -> Severity {
        let p = self.priority();
        if p >= 90 {
            Severity::Critical
        } else if p >= 30 {
            Severity::Warning
        } else {
            Severity::Info
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// Aggregate health derived from unacknowledged alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub alert_type: AlertType,
    pub message: String,
    pub details: JsonValue,
    pub severity: Severity,
    pub priority: u8,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
}

impl Alert {
    pub fn new(alert_type: AlertType, message: impl Into<String>, details: JsonValue) -> Self {
        Self {
            id: AlertId::new(),
            alert_type,
            message: message.into(),
            details,
            severity: alert_type.severity(),
            priority: alert_type.priority(),
            timestamp: Utc::now(),
            acknowledged: false,
        }
    }
}

/// One live alert per type. Raising a type that is already present
/// replaces the old instance (fresh id, timestamp, and ack state).
#[derive(Debug, Default)]
pub struct AlertRegistry {
    alerts: RwLock<HashMap<AlertType, Alert>>,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise an alert, replacing any live alert of the same type.
    pub fn raise(
        &self,
        alert_type: AlertType,
        message: impl Into<String>,
        details: JsonValue,
    ) -> Alert {
        let alert = Alert::new(alert_type, message, details);
        self.write().insert(alert_type, alert.clone());
        alert
    }

    /// Drop the live alert of a type, if present.
    pub fn remove(&self, alert_type: AlertType) -> bool {
        self.write().remove(&alert_type).is_some()
    }

    pub fn acknowledge(&self, id: AlertId) -> bool {
        let mut alerts = self.write();
        match alerts.values_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    /// Clear all alerts, or only those of a given severity.
    pub fn clear(&self, severity: Option<Severity>) {
        let mut alerts = self.write();
        match severity {
            None => alerts.clear(),
            Some(s) => alerts.retain(|_, a| a.severity != s),
        }
    }

    pub fn get(&self, alert_type: AlertType) -> Option<Alert> {
        self.read().get(&alert_type).cloned()
    }

    /// Live alerts, priority-descending (ties broken oldest first).
    pub fn sorted(&self) -> Vec<Alert> {
        let mut all: Vec<Alert> = self.read().values().cloned().collect();
        all.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.timestamp.cmp(&b.timestamp))
        });
        all
    }

    /// Red iff an unacknowledged critical is live, yellow iff an
    /// unacknowledged warning is, green otherwise.
    pub fn health(&self) -> HealthStatus {
        let alerts = self.read();
        let mut status = HealthStatus::Green;
        for alert in alerts.values() {
            if alert.acknowledged {
                continue;
            }
            match alert.severity {
                Severity::Critical => return HealthStatus::Red,
                Severity::Warning => status = HealthStatus::Yellow,
                Severity::Info => {}
            }
        }
        status
    }

    pub fn count_by(&self, severity: Severity) -> usize {
        self.read()
            .values()
            .filter(|a| a.severity == severity)
            .count()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<AlertType, Alert>> {
        self.alerts.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<AlertType, Alert>> {
        self.alerts.write().unwrap_or_else(|e| e.into_inner())
    }
}
