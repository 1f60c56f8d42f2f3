//! Boundary to external operational lookups.
//!
//! Stock levels, lot expiries, connectivity, and backup timestamps come
//! from outside the process. The monitor treats a failed probe as a
//! degraded signal, never a crash; some failure classes are silent.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tillguard_core::ProductId;

#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    #[error("http status {0}")]
    Http(u16),
    #[error("offline")]
    Offline,
    #[error("timed out")]
    Timeout,
    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    /// Failure classes that are expected in normal degraded operation
    /// (endpoint missing, auth expired, gateway down, no network) and must
    /// only be logged, never raised as alerts.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            ProbeError::Offline | ProbeError::Http(401 | 404 | 502 | 503)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityInfo {
    pub online: bool,
    pub last_online: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowStockItem {
    pub product_id: ProductId,
    pub name: String,
    pub stock: f64,
    pub min_stock: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpiringLot {
    pub product_id: ProductId,
    pub name: String,
    pub lot: String,
    pub expires_on: chrono::NaiveDate,
}

/// External lookup surface consumed by the monitor.
pub trait OpsProbe: Send + Sync {
    fn low_stock(&self) -> Result<Vec<LowStockItem>, ProbeError>;
    fn expiring_lots(&self, within_days: u32) -> Result<Vec<ExpiringLot>, ProbeError>;
    fn connectivity(&self) -> Result<ConnectivityInfo, ProbeError>;
    fn last_backup(&self) -> Result<Option<DateTime<Utc>>, ProbeError>;
}

#[derive(Debug)]
struct StaticProbeState {
    low_stock: Result<Vec<LowStockItem>, ProbeError>,
    expiring: Result<Vec<ExpiringLot>, ProbeError>,
    connectivity: Result<ConnectivityInfo, ProbeError>,
    last_backup: Result<Option<DateTime<Utc>>, ProbeError>,
}

/// Fixed-answer probe for wiring and tests. Each lookup can be primed with
/// data or with a failure.
pub struct StaticProbe {
    state: RwLock<StaticProbeState>,
}

impl Default for StaticProbe {
    fn default() -> Self {
        Self {
            state: RwLock::new(StaticProbeState {
                low_stock: Ok(Vec::new()),
                expiring: Ok(Vec::new()),
                connectivity: Ok(ConnectivityInfo {
                    online: true,
                    last_online: Some(Utc::now()),
                }),
                last_backup: Ok(Some(Utc::now())),
            }),
        }
    }
}

impl StaticProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_low_stock(&self, items: Vec<LowStockItem>) {
        self.write().low_stock = Ok(items);
    }

    pub fn fail_low_stock(&self, error: ProbeError) {
        self.write().low_stock = Err(error);
    }

    pub fn set_expiring_lots(&self, lots: Vec<ExpiringLot>) {
        self.write().expiring = Ok(lots);
    }

    pub fn fail_expiring_lots(&self, error: ProbeError) {
        self.write().expiring = Err(error);
    }

    pub fn set_connectivity(&self, info: ConnectivityInfo) {
        self.write().connectivity = Ok(info);
    }

    pub fn fail_connectivity(&self, error: ProbeError) {
        self.write().connectivity = Err(error);
    }

    pub fn set_last_backup(&self, at: Option<DateTime<Utc>>) {
        self.write().last_backup = Ok(at);
    }

    pub fn fail_last_backup(&self, error: ProbeError) {
        self.write().last_backup = Err(error);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StaticProbeState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StaticProbeState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl OpsProbe for StaticProbe {
    fn low_stock(&self) -> Result<Vec<LowStockItem>, ProbeError> {
        self.read().low_stock.clone()
    }

    fn expiring_lots(&self, _within_days: u32) -> Result<Vec<ExpiringLot>, ProbeError> {
        self.read().expiring.clone()
    }

    fn connectivity(&self) -> Result<ConnectivityInfo, ProbeError> {
        self.read().connectivity.clone()
    }

    fn last_backup(&self) -> Result<Option<DateTime<Utc>>, ProbeError> {
        self.read().last_backup.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_classes_cover_expected_degradation() {
        assert!(ProbeError::Offline.is_silent());
        assert!(ProbeError::Http(401).is_silent());
        assert!(ProbeError::Http(404).is_silent());
        assert!(ProbeError::Http(502).is_silent());
        assert!(ProbeError::Http(503).is_silent());

        assert!(!ProbeError::Http(500).is_silent());
        assert!(!ProbeError::Timeout.is_silent());
        assert!(!ProbeError::Other("boom".to_string()).is_silent());
    }

    #[test]
    fn static_probe_round_trips_primed_answers() {
        let probe = StaticProbe::new();
        probe.set_low_stock(vec![LowStockItem {
            product_id: ProductId::new(),
            name: "flour".to_string(),
            stock: 2.0,
            min_stock: 5.0,
        }]);

        assert_eq!(probe.low_stock().unwrap().len(), 1);
        assert!(probe.connectivity().unwrap().online);
        assert!(probe.last_backup().unwrap().is_some());

        probe.fail_low_stock(ProbeError::Http(503));
        assert!(probe.low_stock().unwrap_err().is_silent());
    }
}
