use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gyaledger_core::{DomainError, DomainResult, Entity, EntityId, Versioned};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub EntityId);

impl ProductId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// ABC inventory class, from the mean of the three sub-scores:
/// A at 70 or above, B at 40, everything else C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbcClass {
    A,
    B,
    #[default]
    C,
}

/// The three 0–100 sub-scores behind the ABC class.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductScores {
    pub rentabilidad: f64,
    pub rotacion: f64,
    pub demanda: f64,
}

impl ProductScores {
    pub fn mean(&self) -> f64 {
        (self.rentabilidad + self.rotacion + self.demanda) / 3.0
    }
}

/// Derived product statistics. Pipeline-owned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductMetrics {
    pub ingresos_mes: f64,
    pub utilidad_mes: f64,
    pub ingresos_trimestre: f64,
    pub utilidad_trimestre: f64,
    pub unidades_vendidas: u64,
    pub precio_venta_promedio: f64,
    pub precio_compra_promedio: f64,
    pub margen_bruto_pct: f64,
    pub margen_neto_pct: f64,
    /// Annualized inventory turns.
    pub rotacion_anual: f64,
    /// None while demand is zero.
    pub dias_stock_restante: Option<f64>,
    pub scores: ProductScores,
    pub clasificacion: AbcClass,
    pub computed_at: Option<DateTime<Utc>>,
}

/// A warehouse product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub nombre: String,
    /// Units currently in the warehouse.
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub metrics: ProductMetrics,
    version: u64,
}

impl Product {
    pub fn new(id: ProductId, nombre: impl Into<String>, stock: u32, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            nombre: nombre.into(),
            stock,
            created_at,
            metrics: ProductMetrics::default(),
            version: 0,
        }
    }

    pub fn consume_stock(&mut self, qty: u32) -> DomainResult<()> {
        if qty == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        // Warehouse stock may lag the purchase-order tracking; never go below zero.
        self.stock = self.stock.saturating_sub(qty);
        Ok(())
    }

    pub fn restore_stock(&mut self, qty: u32) {
        self.stock += qty;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for Product {
    fn version(&self) -> u64 {
        self.version
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }
}
