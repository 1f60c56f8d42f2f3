//! `tillguard-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the ledger error model, money tolerance helpers, and the
//! audit trail abstraction every state-changing operation reports into.

pub mod audit;
pub mod error;
pub mod id;
pub mod money;

pub use audit::{AuditRecord, AuditSink, AuditSinkError, InMemoryAuditSink, NullAuditSink, emit};
pub use error::{LedgerError, LedgerResult};
pub use id::{
    AlertId, ClosureId, EntryId, MovementId, ProductId, SaleId, SessionId, SubscriptionId, UserId,
};
pub use money::{TOLERANCE, approx_eq, round2};
