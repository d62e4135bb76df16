use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gyaledger_core::{DomainError, DomainResult, Entity, EntityId};

/// Alert identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub EntityId);

impl AlertId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AlertId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Alert condition kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    StockBajo,
    ClienteMoroso,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Media,
    Alta,
    Critica,
}

/// Alert lifecycle: activa → resuelta | descartada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Activa,
    Resuelta,
    Descartada,
}

/// A threshold breach on some entity. Deduplicated by
/// (entity, kind, estado = activa) while open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub entity_id: EntityId,
    pub mensaje: String,
    pub estado: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn open(
        kind: AlertKind,
        severity: AlertSeverity,
        entity_id: EntityId,
        mensaje: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AlertId::new(EntityId::new()),
            kind,
            severity,
            entity_id,
            mensaje: mensaje.into(),
            estado: AlertStatus::Activa,
            created_at: now,
            resolved_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.estado == AlertStatus::Activa
    }

    pub fn resolve(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_active() {
            return Err(DomainError::invariant("only active alerts can be resolved"));
        }
        self.estado = AlertStatus::Resuelta;
        self.resolved_at = Some(now);
        Ok(())
    }

    pub fn dismiss(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_active() {
            return Err(DomainError::invariant("only active alerts can be dismissed"));
        }
        self.estado = AlertStatus::Descartada;
        self.resolved_at = Some(now);
        Ok(())
    }
}

impl Entity for Alert {
    type Id = AlertId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
