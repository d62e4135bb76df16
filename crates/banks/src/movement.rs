use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gyaledger_core::{Entity, EntityId};

use crate::bank::BankId;

/// Movement identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(pub EntityId);

impl MovementId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for MovementId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// What kind of bank-affecting event a movement records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    DistribucionGya,
    Abono,
    DevolucionGya,
    TransferenciaEntrada,
    TransferenciaSalida,
    Pago,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::DistribucionGya => "distribucion_gya",
            MovementKind::Abono => "abono",
            MovementKind::DevolucionGya => "devolucion_gya",
            MovementKind::TransferenciaEntrada => "transferencia_entrada",
            MovementKind::TransferenciaSalida => "transferencia_salida",
            MovementKind::Pago => "pago",
        }
    }
}

/// One row per bank-affecting event, created in the same commit as its
/// parent event. Append-only: movements are the trail banks are reconciled
/// against, and are only ever removed by the admin sale delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub bank_id: BankId,
    pub kind: MovementKind,
    /// Realized cash delta for the bank (signed; outflows negative).
    pub monto: f64,
    /// Historic delta for distribution/reversal rows (signed), `None` for
    /// pure cash movements.
    pub monto_historico: Option<f64>,
    /// The sale / order / transfer this movement belongs to.
    pub related: Option<EntityId>,
    pub descripcion: String,
    pub occurred_at: DateTime<Utc>,
}

impl Movement {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: MovementId,
        bank_id: BankId,
        kind: MovementKind,
        monto: f64,
        monto_historico: Option<f64>,
        related: Option<EntityId>,
        descripcion: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            bank_id,
            kind,
            monto,
            monto_historico,
            related,
            descripcion: descripcion.into(),
            occurred_at,
        }
    }

    /// Inflow movements carry a positive cash delta.
    pub fn is_inflow(&self) -> bool {
        self.monto > 0.0
    }
}

impl Entity for Movement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
