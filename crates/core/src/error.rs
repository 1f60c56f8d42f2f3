//! Ledger error model.

use chrono::NaiveDate;
use thiserror::Error;

use crate::id::{ClosureId, EntryId};

/// Result type used across the ledger layer.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, sealed periods). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    /// A value failed validation (e.g. malformed or missing input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Entry debits and credits do not net to zero within tolerance.
    #[error("unbalanced entry: debit {total_debit:.2} != credit {total_credit:.2}")]
    UnbalancedEntry { total_debit: f64, total_credit: f64 },

    /// The entry date falls inside a sealed accounting period.
    #[error("period closed: {date} falls inside {period_start}..={period_end}")]
    PeriodClosed {
        date: NaiveDate,
        period_start: NaiveDate,
        period_end: NaiveDate,
    },

    /// An account with this code already exists.
    #[error("duplicate account code: {0}")]
    DuplicateAccount(String),

    /// A line or parent reference names an account that does not exist.
    #[error("unknown account code: {0}")]
    UnknownAccount(String),

    /// The referenced account exists but is deactivated.
    #[error("inactive account code: {0}")]
    InactiveAccount(String),

    /// System-seeded accounts cannot be deactivated.
    #[error("system account cannot be modified: {0}")]
    SystemAccount(String),

    /// The entry has already been voided.
    #[error("entry already voided: {0}")]
    AlreadyVoided(EntryId),

    /// A requested record was not found.
    #[error("not found")]
    NotFound,

    /// A stored closure hash no longer matches its content digest.
    #[error("tamper detected on closure {closure_id}")]
    TamperDetected { closure_id: ClosureId },
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unbalanced(total_debit: f64, total_credit: f64) -> Self {
        Self::UnbalancedEntry {
            total_debit,
            total_credit,
        }
    }

    pub fn period_closed(date: NaiveDate, period_start: NaiveDate, period_end: NaiveDate) -> Self {
        Self::PeriodClosed {
            date,
            period_start,
            period_end,
        }
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
