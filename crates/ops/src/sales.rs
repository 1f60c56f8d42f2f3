//! Sales store: completed tickets with their line items.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use tillguard_core::{AuditRecord, AuditSink, ProductId, SaleId, emit, round2};

/// One line on a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: f64,
    pub qty: f64,
}

/// Completed sale. `total` is the stored header amount and may disagree
/// with the item sum until the monitor corrects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub total: f64,
    pub items: Vec<SaleItem>,
    pub voided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Sum of price × qty across items, rounded to cents.
    pub fn items_total(&self) -> f64 {
        round2(self.items.iter().map(|i| i.price * i.qty).sum())
    }

    pub fn is_voided(&self) -> bool {
        self.voided_at.is_some()
    }
}

#[derive(Debug, Default)]
struct SalesState {
    sales: HashMap<SaleId, Sale>,
    order: Vec<SaleId>,
}

/// In-memory sales registry.
pub struct SalesStore {
    state: RwLock<SalesState>,
    audit: Arc<dyn AuditSink>,
}

impl SalesStore {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            state: RwLock::new(SalesState::default()),
            audit,
        }
    }

    pub fn insert(&self, items: Vec<SaleItem>, total: f64) -> Sale {
        let sale = Sale {
            id: SaleId::new(),
            total,
            items,
            voided_at: None,
            created_at: Utc::now(),
        };
        let mut state = self.write();
        state.order.push(sale.id);
        state.sales.insert(sale.id, sale.clone());
        sale
    }

    pub fn get(&self, id: SaleId) -> Option<Sale> {
        self.read().sales.get(&id).cloned()
    }

    /// Non-voided sales in insertion order.
    pub fn list_active(&self) -> Vec<Sale> {
        let state = self.read();
        state
            .order
            .iter()
            .filter_map(|id| state.sales.get(id))
            .filter(|s| !s.is_voided())
            .cloned()
            .collect()
    }

    /// Overwrite a sale's stored total. Audited with before/after.
    pub fn set_total(&self, id: SaleId, total: f64, reason: &str) -> bool {
        let before = {
            let mut state = self.write();
            match state.sales.get_mut(&id) {
                Some(sale) => {
                    let before = sale.total;
                    sale.total = total;
                    before
                }
                None => return false,
            }
        };
        tracing::info!(sale_id = %id, before, after = total, reason, "sale total rewritten");
        emit(
            self.audit.as_ref(),
            AuditRecord::new(
                "sale",
                id.to_string(),
                "auto_correct",
                json!({ "before": before, "after": total, "reason": reason }),
            ),
        );
        true
    }

    pub fn void(&self, id: SaleId) -> bool {
        let mut state = self.write();
        match state.sales.get_mut(&id) {
            Some(sale) if !sale.is_voided() => {
                sale.voided_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    pub fn count(&self) -> usize {
        self.read().sales.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SalesState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SalesState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
