//! Period sealing: hash-sealed closure records and the closed-period flag.
//!
//! A closure asserts that a date range's books are finalized. The stored
//! SHA-256 digest covers the closure's content fields; re-verification that
//! fails to reproduce the digest is a tamper signal. Reopening a period is a
//! policy action only and never touches stored hashes.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use tillguard_core::{AuditRecord, AuditSink, ClosureId, LedgerError, LedgerResult, emit};

/// Number of closures retained (most recent first).
const RETAINED_CLOSURES: usize = 20;

/// Immutable, hash-sealed record of a period close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodClosure {
    pub id: ClosureId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub closed_at: DateTime<Utc>,
    pub accountant_name: String,
    pub notes: String,
    /// Opaque reference to captured signature evidence, if any.
    pub signature: Option<String>,
    /// Hex SHA-256 over the canonical content payload.
    pub hash: String,
}

/// Input for sealing a period.
#[derive(Debug, Clone)]
pub struct NewClosure {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub accountant_name: String,
    pub notes: String,
    pub signature: Option<String>,
}

/// Canonical digest payload. The signature reference is deliberately
/// excluded: it points at external evidence, not closure content.
fn closure_digest(
    period_start: NaiveDate,
    period_end: NaiveDate,
    closed_at: DateTime<Utc>,
    accountant_name: &str,
    notes: &str,
) -> String {
    let payload = json!({
        "period_start": period_start,
        "period_end": period_end,
        "closed_at": closed_at,
        "accountant_name": accountant_name,
        "notes": notes,
    });
    let mut hasher = Sha256::new();
    hasher.update(payload.to_string().as_bytes());
    hasher
        .finalize()
        .iter()
        .fold(String::with_capacity(64), |mut acc, b| {
            use std::fmt::Write;
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

#[derive(Debug, Default)]
struct PeriodState {
    closures: Vec<PeriodClosure>,
    closed: Option<(NaiveDate, NaiveDate)>,
}

/// Closure store plus the closed-period flag the journal engine consults.
pub struct PeriodBook {
    state: RwLock<PeriodState>,
    audit: Arc<dyn AuditSink>,
}

impl PeriodBook {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            state: RwLock::new(PeriodState::default()),
            audit,
        }
    }

    /// Seal a period: store the hashed closure and set the closed flag.
    pub fn close(&self, new: NewClosure) -> LedgerResult<PeriodClosure> {
        if new.period_end < new.period_start {
            return Err(LedgerError::validation(
                "period_end must not precede period_start",
            ));
        }
        if new.accountant_name.trim().is_empty() {
            return Err(LedgerError::validation("accountant_name is required"));
        }

        let closed_at = Utc::now();
        let closure = PeriodClosure {
            id: ClosureId::new(),
            period_start: new.period_start,
            period_end: new.period_end,
            closed_at,
            accountant_name: new.accountant_name.clone(),
            notes: new.notes.clone(),
            signature: new.signature,
            hash: closure_digest(
                new.period_start,
                new.period_end,
                closed_at,
                &new.accountant_name,
                &new.notes,
            ),
        };

        {
            let mut state = self.write();
            state.closures.insert(0, closure.clone());
            state.closures.truncate(RETAINED_CLOSURES);
            state.closed = Some((new.period_start, new.period_end));
        }

        tracing::info!(
            closure_id = %closure.id,
            period_start = %closure.period_start,
            period_end = %closure.period_end,
            "period sealed"
        );
        emit(
            self.audit.as_ref(),
            AuditRecord::new(
                "accounting",
                closure.id.to_string(),
                "period_close",
                json!({
                    "period_start": closure.period_start,
                    "period_end": closure.period_end,
                    "accountant_name": closure.accountant_name,
                    "hash": closure.hash,
                }),
            ),
        );
        Ok(closure)
    }

    /// Recompute the digest over the stored content fields and compare.
    pub fn verify(&self, closure: &PeriodClosure) -> bool {
        closure.hash
            == closure_digest(
                closure.period_start,
                closure.period_end,
                closure.closed_at,
                &closure.accountant_name,
                &closure.notes,
            )
    }

    /// Sweep all retained closures; returns the ids whose hash no longer
    /// matches. Each mismatch is audited as a tamper event.
    pub fn verify_all(&self) -> Vec<ClosureId> {
        let closures = self.closures();
        let mut tampered = Vec::new();
        for closure in &closures {
            if !self.verify(closure) {
                tracing::error!(closure_id = %closure.id, "closure hash mismatch");
                emit(
                    self.audit.as_ref(),
                    AuditRecord::new(
                        "accounting",
                        closure.id.to_string(),
                        "period_tamper",
                        json!({
                            "period_start": closure.period_start,
                            "period_end": closure.period_end,
                        }),
                    ),
                );
                tampered.push(closure.id);
            }
        }
        tampered
    }

    /// Clear the closed flag. Stored hashes are untouched.
    pub fn reopen(&self) {
        let cleared = {
            let mut state = self.write();
            state.closed.take()
        };
        if let Some((start, end)) = cleared {
            tracing::info!(period_start = %start, period_end = %end, "period reopened");
            emit(
                self.audit.as_ref(),
                AuditRecord::new(
                    "accounting",
                    format!("{start}..{end}"),
                    "period_reopen",
                    json!({ "period_start": start, "period_end": end }),
                ),
            );
        }
    }

    /// True when `date` falls inside the currently closed period.
    pub fn is_closed_for(&self, date: NaiveDate) -> bool {
        matches!(self.read().closed, Some((start, end)) if date >= start && date <= end)
    }

    pub fn closed_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.read().closed
    }

    /// Retained closures, most recent first.
    pub fn closures(&self) -> Vec<PeriodClosure> {
        self.read().closures.clone()
    }

    /// Replace a stored closure (test/diagnostic hook for tamper scenarios).
    #[doc(hidden)]
    pub fn overwrite_closure(&self, closure: PeriodClosure) {
        let mut state = self.write();
        if let Some(slot) = state.closures.iter_mut().find(|c| c.id == closure.id) {
            *slot = closure;
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, PeriodState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, PeriodState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tillguard_core::NullAuditSink;

    fn book() -> PeriodBook {
        PeriodBook::new(Arc::new(NullAuditSink))
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn new_closure() -> NewClosure {
        NewClosure {
            period_start: date("2025-01-01"),
            period_end: date("2025-01-31"),
            accountant_name: "R. Fuentes".to_string(),
            notes: "January close".to_string(),
            signature: None,
        }
    }

    #[test]
    fn close_sets_flag_and_verifiable_hash() {
        let book = book();
        let closure = book.close(new_closure()).unwrap();

        assert_eq!(closure.hash.len(), 64);
        assert!(book.verify(&closure));
        assert!(book.is_closed_for(date("2025-01-15")));
        assert!(!book.is_closed_for(date("2025-02-01")));
    }

    #[test]
    fn verify_flips_under_any_field_mutation() {
        let book = book();
        let closure = book.close(new_closure()).unwrap();

        let mut tampered = closure.clone();
        tampered.notes = "January close ".to_string();
        assert!(!book.verify(&tampered));

        let mut tampered = closure.clone();
        tampered.accountant_name = "Someone Else".to_string();
        assert!(!book.verify(&tampered));

        let mut tampered = closure.clone();
        tampered.period_end = date("2025-02-28");
        assert!(!book.verify(&tampered));

        // Signature is evidence, not content.
        let mut resigned = closure;
        resigned.signature = Some("sig-ref-1".to_string());
        assert!(book.verify(&resigned));
    }

    #[test]
    fn verify_all_flags_only_corrupted_closures() {
        let book = book();
        let good = book.close(new_closure()).unwrap();
        let mut second = new_closure();
        second.period_start = date("2025-02-01");
        second.period_end = date("2025-02-28");
        let bad = book.close(second).unwrap();

        let mut corrupted = bad.clone();
        corrupted.hash = format!("{}00", &corrupted.hash[..62]);
        book.overwrite_closure(corrupted);

        let tampered = book.verify_all();
        assert_eq!(tampered, vec![bad.id]);
        assert!(!tampered.contains(&good.id));
    }

    #[test]
    fn reopen_clears_flag_but_keeps_hashes() {
        let book = book();
        let closure = book.close(new_closure()).unwrap();

        book.reopen();
        assert!(!book.is_closed_for(date("2025-01-15")));
        assert!(book.verify(&book.closures()[0]));
        assert_eq!(book.closures()[0].hash, closure.hash);
    }

    #[test]
    fn retains_most_recent_twenty() {
        let book = book();
        for month in 0..25u32 {
            let start = date("2020-01-01") + chrono::Duration::days((month * 31) as i64);
            book.close(NewClosure {
                period_start: start,
                period_end: start + chrono::Duration::days(27),
                accountant_name: "R. Fuentes".to_string(),
                notes: format!("close {month}"),
                signature: None,
            })
            .unwrap();
        }
        let closures = book.closures();
        assert_eq!(closures.len(), RETAINED_CLOSURES);
        assert_eq!(closures[0].notes, "close 24");
    }

    #[test]
    fn rejects_inverted_range_and_missing_name() {
        let book = book();
        let mut inverted = new_closure();
        inverted.period_end = date("2024-12-01");
        assert!(matches!(
            book.close(inverted),
            Err(LedgerError::Validation(_))
        ));

        let mut unnamed = new_closure();
        unnamed.accountant_name = "  ".to_string();
        assert!(matches!(
            book.close(unnamed),
            Err(LedgerError::Validation(_))
        ));
    }
}
