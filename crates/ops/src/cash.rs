//! Cash sessions: register shifts, their movements, and counted variances.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use tillguard_core::{AuditRecord, AuditSink, MovementId, SessionId, UserId, emit, round2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Open,
    Closed,
}

/// How a movement affects the drawer: sales and cash-in add, refunds and
/// cash-out subtract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Sale,
    Refund,
    CashIn,
    CashOut,
}

impl MovementKind {
    pub fn sign(self) -> f64 {
        match self {
            MovementKind::Sale | MovementKind::CashIn => 1.0,
            MovementKind::Refund | MovementKind::CashOut => -1.0,
        }
    }
}

/// One register shift. `expected_cash` is the stored expectation the
/// monitor reconciles against the movement history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashSession {
    pub id: SessionId,
    pub status: SessionStatus,
    pub opening_amount: f64,
    pub expected_cash: f64,
    pub opened_at: DateTime<Utc>,
    pub closed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashMovement {
    pub id: MovementId,
    pub session_id: SessionId,
    pub kind: MovementKind,
    pub amount: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Counted-vs-expected difference recorded at a drawer count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashVariance {
    pub session_id: SessionId,
    pub variance: f64,
    pub user_id: Option<UserId>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CashState {
    sessions: HashMap<SessionId, CashSession>,
    movements: Vec<CashMovement>,
    variances: Vec<CashVariance>,
}

/// In-memory cash-session registry.
pub struct CashStore {
    state: RwLock<CashState>,
    audit: Arc<dyn AuditSink>,
}

impl CashStore {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            state: RwLock::new(CashState::default()),
            audit,
        }
    }

    pub fn open_session(&self, opening_amount: f64) -> CashSession {
        let session = CashSession {
            id: SessionId::new(),
            status: SessionStatus::Open,
            opening_amount,
            expected_cash: opening_amount,
            opened_at: Utc::now(),
            closed_by: None,
        };
        self.write().sessions.insert(session.id, session.clone());
        session
    }

    pub fn close_session(&self, id: SessionId, closed_by: impl Into<String>) -> bool {
        let mut state = self.write();
        match state.sessions.get_mut(&id) {
            Some(session) if session.status == SessionStatus::Open => {
                session.status = SessionStatus::Closed;
                session.closed_by = Some(closed_by.into());
                true
            }
            _ => false,
        }
    }

    /// Record a drawer movement. The stored `expected_cash` is NOT updated
    /// here; reconciliation recomputes it from the movement history.
    pub fn record_movement(
        &self,
        session_id: SessionId,
        kind: MovementKind,
        amount: f64,
    ) -> CashMovement {
        let movement = CashMovement {
            id: MovementId::new(),
            session_id,
            kind,
            amount,
            recorded_at: Utc::now(),
        };
        self.write().movements.push(movement.clone());
        movement
    }

    pub fn record_variance(&self, session_id: SessionId, variance: f64, user_id: Option<UserId>) {
        self.write().variances.push(CashVariance {
            session_id,
            variance,
            user_id,
            recorded_at: Utc::now(),
        });
    }

    pub fn session(&self, id: SessionId) -> Option<CashSession> {
        self.read().sessions.get(&id).cloned()
    }

    pub fn open_sessions(&self) -> Vec<CashSession> {
        let mut open: Vec<CashSession> = self
            .read()
            .sessions
            .values()
            .filter(|s| s.status == SessionStatus::Open)
            .cloned()
            .collect();
        open.sort_by_key(|s| s.opened_at);
        open
    }

    pub fn movements_of(&self, session_id: SessionId) -> Vec<CashMovement> {
        self.read()
            .movements
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect()
    }

    pub fn variances(&self) -> Vec<CashVariance> {
        self.read().variances.clone()
    }

    /// Expected drawer cash from the movement history:
    /// opening + sales + cash-in − refunds − cash-out.
    pub fn expected_from_movements(&self, session_id: SessionId) -> Option<f64> {
        let state = self.read();
        let session = state.sessions.get(&session_id)?;
        let delta: f64 = state
            .movements
            .iter()
            .filter(|m| m.session_id == session_id)
            .map(|m| m.kind.sign() * m.amount)
            .sum();
        Some(round2(session.opening_amount + delta))
    }

    /// Overwrite a session's stored expectation. Audited with before/after.
    pub fn set_expected_cash(&self, id: SessionId, expected: f64, reason: &str) -> bool {
        let before = {
            let mut state = self.write();
            match state.sessions.get_mut(&id) {
                Some(session) => {
                    let before = session.expected_cash;
                    session.expected_cash = expected;
                    before
                }
                None => return false,
            }
        };
        tracing::info!(
            session_id = %id,
            before,
            after = expected,
            reason,
            "expected cash rewritten"
        );
        emit(
            self.audit.as_ref(),
            AuditRecord::new(
                "cash_session",
                id.to_string(),
                "auto_correct",
                json!({ "before": before, "after": expected, "reason": reason }),
            ),
        );
        true
    }

    pub fn count(&self) -> usize {
        self.read().sessions.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CashState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CashState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
