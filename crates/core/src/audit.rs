//! Audit trail abstraction.
//!
//! Every state-changing operation emits an [`AuditRecord`] to an external
//! sink. Emission is fire-and-forget: a sink failure is logged and swallowed,
//! never propagated into the primary operation.

use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// One audit event: who did what to which entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Entity class, e.g. `journal_entry`, `accounting`, `sale`, `cash_session`.
    pub entity_type: String,
    /// Identifier of the affected entity (string form; entities use mixed id types).
    pub entity_id: String,
    /// Action name, e.g. `post`, `void`, `period_close`, `auto_correct`.
    pub action: String,
    /// Actor, when known. `None` for system-initiated actions.
    pub actor: Option<String>,
    /// Free-form structured detail (before/after values, amounts, hashes).
    pub details: JsonValue,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        action: impl Into<String>,
        details: JsonValue,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            action: action.into(),
            actor: None,
            details,
            timestamp: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum AuditSinkError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for audit records.
///
/// Implementations may write to a database, a file, or a remote collector.
/// Callers must treat failures as non-fatal (see [`emit`]).
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord) -> Result<(), AuditSinkError>;
}

/// Emit a record, logging and swallowing any sink failure.
pub fn emit(sink: &dyn AuditSink, record: AuditRecord) {
    let entity_type = record.entity_type.clone();
    let action = record.action.clone();
    if let Err(e) = sink.record(record) {
        tracing::warn!(%entity_type, %action, error = %e, "audit sink failed; record dropped");
    }
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _record: AuditRecord) -> Result<(), AuditSinkError> {
        Ok(())
    }
}

/// Bounded in-memory sink for tests and diagnostics.
#[derive(Debug)]
pub struct InMemoryAuditSink {
    records: RwLock<VecDeque<AuditRecord>>,
    capacity: usize,
}

impl InMemoryAuditSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            capacity,
        }
    }

    /// All retained records, oldest first.
    pub fn records(&self) -> Vec<AuditRecord> {
        match self.records.read() {
            Ok(records) => records.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Records matching an entity type + action pair.
    pub fn find(&self, entity_type: &str, action: &str) -> Vec<AuditRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.entity_type == entity_type && r.action == action)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryAuditSink {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, record: AuditRecord) -> Result<(), AuditSinkError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| AuditSinkError::Unavailable("lock poisoned".to_string()))?;
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
        Ok(())
    }
}
