//! `tillguard-ops` — operational stores the integrity monitor watches.
//!
//! Sales, cash sessions, and inventory are the mutable point-of-sale state;
//! [`OpsProbe`] is the boundary to external lookups (stock levels,
//! connectivity, backups) that may fail without taking the monitor down.

pub mod cash;
pub mod inventory;
pub mod probe;
pub mod sales;

pub use cash::{CashMovement, CashSession, CashStore, CashVariance, MovementKind, SessionStatus};
pub use inventory::{InventoryMovement, InventoryStore, Product};
pub use probe::{ConnectivityInfo, ExpiringLot, LowStockItem, OpsProbe, ProbeError, StaticProbe};
pub use sales::{Sale, SaleItem, SalesStore};
