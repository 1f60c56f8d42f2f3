//! Inventory store: products with stock levels and their movement history.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillguard_core::{MovementId, ProductId, round2};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub stock: f64,
    pub min_stock: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub delta: f64,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct InventoryState {
    products: HashMap<ProductId, Product>,
    movements: Vec<InventoryMovement>,
}

/// In-memory product registry.
#[derive(Debug, Default)]
pub struct InventoryStore {
    state: RwLock<InventoryState>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, product: Product) {
        self.write().products.insert(product.id, product);
    }

    /// Apply a stock delta and record the movement. Stock is allowed to go
    /// negative; the monitor flags it.
    pub fn adjust(&self, product_id: ProductId, delta: f64, reason: impl Into<String>) {
        let mut state = self.write();
        if let Some(product) = state.products.get_mut(&product_id) {
            product.stock = round2(product.stock + delta);
        }
        state.movements.push(InventoryMovement {
            id: MovementId::new(),
            product_id,
            delta,
            reason: reason.into(),
            recorded_at: Utc::now(),
        });
    }

    pub fn product(&self, id: ProductId) -> Option<Product> {
        self.read().products.get(&id).cloned()
    }

    pub fn products(&self) -> Vec<Product> {
        let mut all: Vec<Product> = self.read().products.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn movements(&self) -> Vec<InventoryMovement> {
        self.read().movements.clone()
    }

    /// Products whose stock has gone below zero.
    pub fn negative_stock(&self) -> Vec<Product> {
        let mut negative: Vec<Product> = self
            .read()
            .products
            .values()
            .filter(|p| p.stock < 0.0)
            .cloned()
            .collect();
        negative.sort_by(|a, b| a.name.cmp(&b.name));
        negative
    }

    /// Movements whose product no longer exists in the registry.
    pub fn orphan_movements(&self) -> Vec<InventoryMovement> {
        let state = self.read();
        state
            .movements
            .iter()
            .filter(|m| !state.products.contains_key(&m.product_id))
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.read().products.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InventoryState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InventoryState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
