use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gyaledger_core::{DomainError, DomainResult, Entity, EntityId, Versioned};
use gyaledger_distribution::EPSILON;
use gyaledger_parties::DistributorId;
use gyaledger_products::ProductId;

/// Purchase order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(pub EntityId);

impl PurchaseOrderId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase order lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Abierta,
    Cerrada,
}

/// Sell-through speed, bucketed by average days per unit sold:
/// ≤7 excelente, ≤15 buena, ≤30 normal, ≤60 lenta, else muy lenta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Efficiency {
    Excelente,
    Buena,
    #[default]
    Normal,
    Lenta,
    MuyLenta,
}

/// Derived rotation statistics for a purchase order. Pipeline-owned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RotationMetrics {
    pub dias_desde_compra: i64,
    pub porcentaje_vendido: f64,
    pub eficiencia: Efficiency,
    pub computed_at: Option<DateTime<Utc>>,
}

/// A purchase order placed with a distributor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: PurchaseOrderId,
    pub distributor_id: DistributorId,
    pub product_id: Option<ProductId>,
    /// Units originally ordered.
    pub cantidad: u32,
    /// Units still unsold against this order. `None` until the first sale
    /// touches the order, at which point tracking is initialized from
    /// `cantidad`.
    pub stock_actual: Option<u32>,
    /// Total cost owed to the distributor for this order.
    pub costo_total: f64,
    pub monto_pagado: f64,
    pub estado: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub metrics: RotationMetrics,
    version: u64,
}

impl PurchaseOrder {
    pub fn new(
        id: PurchaseOrderId,
        distributor_id: DistributorId,
        product_id: Option<ProductId>,
        cantidad: u32,
        costo_total: f64,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if cantidad == 0 {
            return Err(DomainError::validation("cantidad must be positive"));
        }
        if costo_total < 0.0 || !costo_total.is_finite() {
            return Err(DomainError::validation("costo_total must be a non-negative amount"));
        }
        Ok(Self {
            id,
            distributor_id,
            product_id,
            cantidad,
            stock_actual: None,
            costo_total,
            monto_pagado: 0.0,
            estado: OrderStatus::Abierta,
            created_at,
            metrics: RotationMetrics::default(),
            version: 0,
        })
    }

    /// Cost per unit, used to default a sale's purchase price.
    pub fn unit_cost(&self) -> f64 {
        self.costo_total / f64::from(self.cantidad)
    }

    /// Balance still owed to the distributor.
    pub fn remaining_balance(&self) -> f64 {
        (self.costo_total - self.monto_pagado).max(0.0)
    }

    /// Units available for sale, initializing tracking lazily.
    pub fn available_stock(&self) -> u32 {
        self.stock_actual.unwrap_or(self.cantidad)
    }

    /// Fraction of the order still in stock, 0.0–1.0.
    pub fn stock_fraction(&self) -> f64 {
        f64::from(self.available_stock()) / f64::from(self.cantidad)
    }

    pub fn units_sold(&self) -> u32 {
        self.cantidad - self.available_stock()
    }

    /// Take `qty` units out of this order's stock.
    pub fn consume_stock(&mut self, qty: u32) -> DomainResult<()> {
        let available = self.available_stock();
        if qty == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if qty > available {
            return Err(DomainError::validation(format!(
                "insufficient stock on purchase order: requested {qty}, available {available}"
            )));
        }
        self.stock_actual = Some(available - qty);
        Ok(())
    }

    /// Put returned units back, never above the ordered quantity.
    pub fn restore_stock(&mut self, qty: u32) {
        let restored = self.available_stock().saturating_add(qty).min(self.cantidad);
        self.stock_actual = Some(restored);
    }

    /// Register a payment to the distributor against this order.
    pub fn register_payment(&mut self, monto: f64) -> DomainResult<()> {
        if monto <= 0.0 || !monto.is_finite() {
            return Err(DomainError::validation("payment must be positive"));
        }
        let remaining = self.remaining_balance();
        if monto > remaining + EPSILON {
            return Err(DomainError::validation(format!(
                "payment {monto:.2} exceeds remaining balance {remaining:.2}"
            )));
        }
        self.monto_pagado += monto;
        Ok(())
    }
}

impl Entity for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for PurchaseOrder {
    fn version(&self) -> u64 {
        self.version
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }
}
