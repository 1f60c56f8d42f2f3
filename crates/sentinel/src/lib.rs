//! `tillguard-sentinel` — continuous integrity monitor.
//!
//! Runs an ordered battery of checks over the ledger and the operational
//! stores, maintains a prioritized alert registry with an aggregate health
//! status, and (when enabled) auto-corrects derivable stored values with a
//! full audit trail.

pub mod alert;
pub mod monitor;

pub use alert::{Alert, AlertRegistry, AlertType, HealthStatus, Severity};
pub use monitor::{
    Correction, CorrectionTarget, Sentinel, SentinelConfig, SentinelSnapshot, SignalStage,
    SignalThresholds,
};
