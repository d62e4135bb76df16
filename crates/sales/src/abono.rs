use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gyaledger_core::{Entity, EntityId};
use gyaledger_distribution::GyaSplit;

use crate::sale::SaleId;

/// Abono identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbonoId(pub EntityId);

impl AbonoId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AbonoId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// One installment payment against a sale. Append-only: never mutated after
/// creation; only the parent sale and the three banks change as a
/// consequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Abono {
    pub id: AbonoId,
    pub sale_id: SaleId,
    pub monto: f64,
    /// Cumulative paid amount on the sale after this abono.
    pub monto_pagado_acumulado: f64,
    /// This payment's proportional GYA sub-split.
    pub split: GyaSplit,
    pub occurred_at: DateTime<Utc>,
}

impl Entity for Abono {
    type Id = AbonoId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
