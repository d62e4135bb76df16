use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gyaledger_core::{Entity, EntityId};
use gyaledger_distribution::GyaSplit;

use crate::sale::SaleId;

/// Devolución identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DevolucionId(pub EntityId);

impl DevolucionId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for DevolucionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A return of part or all of a sale's quantity. Append-only record of the
/// reversed amounts and of the reembolso owed back to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Devolucion {
    pub id: DevolucionId,
    pub sale_id: SaleId,
    pub cantidad_devuelta: u32,
    pub motivo: String,
    /// Historic amounts reversed, per bucket.
    pub reversal: GyaSplit,
    /// Realized amounts taken back out of the banks, per bucket.
    pub capital_reversal: GyaSplit,
    /// Cash owed back to the client (`capital_reversal` total).
    pub reembolso: f64,
    /// Whether the whole remaining quantity was returned.
    pub es_total: bool,
    pub occurred_at: DateTime<Utc>,
}

impl Entity for Devolucion {
    type Id = DevolucionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
