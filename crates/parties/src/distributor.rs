use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gyaledger_core::{DomainError, DomainResult, Entity, EntityId, Versioned};

/// Distributor (supplier) identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistributorId(pub EntityId);

impl DistributorId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for DistributorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Derived statistics for a distributor, aggregated from its purchase
/// orders and the sales traced back to them. Pipeline-owned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DistributorMetrics {
    pub total_ordenado: f64,
    pub total_pagado: f64,
    pub total_pendiente: f64,
    /// Units still sitting in the distributor's open orders.
    pub stock_total: u64,
    pub utilidad_realizada: f64,
    pub margen_promedio_pct: f64,
    pub computed_at: Option<DateTime<Utc>>,
}

/// A distributor the business buys merchandise from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distributor {
    pub id: DistributorId,
    pub nombre: String,
    /// Cumulative payments made to this distributor.
    pub total_pagado: f64,
    pub created_at: DateTime<Utc>,
    pub metrics: DistributorMetrics,
    version: u64,
}

impl Distributor {
    pub fn new(id: DistributorId, nombre: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            nombre: nombre.into(),
            total_pagado: 0.0,
            created_at,
            metrics: DistributorMetrics::default(),
            version: 0,
        }
    }

    pub fn register_payment(&mut self, monto: f64) -> DomainResult<()> {
        if monto <= 0.0 {
            return Err(DomainError::validation("payment must be positive"));
        }
        self.total_pagado += monto;
        Ok(())
    }
}

impl Entity for Distributor {
    type Id = DistributorId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for Distributor {
    fn version(&self) -> u64 {
        self.version
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payments_accumulate() {
        let mut d = Distributor::new(DistributorId::new(EntityId::new()), "Distribuidora Sur", Utc::now());
        d.register_payment(10_000.0).unwrap();
        d.register_payment(5_000.0).unwrap();
        assert_eq!(d.total_pagado, 15_000.0);
    }

    #[test]
    fn zero_payment_is_rejected() {
        let mut d = Distributor::new(DistributorId::new(EntityId::new()), "X", Utc::now());
        assert!(d.register_payment(0.0).is_err());
    }
}
