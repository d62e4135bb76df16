use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gyaledger_core::{DomainError, DomainResult, Entity, EntityId, Versioned};

/// Client identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub EntityId);

impl ClientId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ClientId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Classification computed by the metrics pipeline.
///
/// Precedence when several conditions hold:
/// moroso > inactivo > vip > frecuente > nuevo > ocasional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientCategory {
    Moroso,
    Inactivo,
    Vip,
    Frecuente,
    Nuevo,
    #[default]
    Ocasional,
}

/// Derived statistics for a client.
///
/// Written only by the metrics pipeline; everything here is recomputable
/// from the client's sales at any time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientMetrics {
    pub total_comprado: f64,
    pub total_pagado: f64,
    pub saldo_pendiente: f64,
    pub ticket_promedio: f64,
    /// None until the client has at least one sale.
    pub dias_sin_comprar: Option<i64>,
    /// Purchases per month over the trailing six months.
    pub frecuencia_compra: f64,
    /// Fraction of non-returned sales fully paid, 0–100.
    pub pago_puntual_pct: f64,
    /// Weighted credit score, 0–100.
    pub score: f64,
    /// Profit the client has generated (utilidades bucket).
    pub utilidad_generada: f64,
    pub categoria: ClientCategory,
    pub computed_at: Option<DateTime<Utc>>,
}

/// A client buying on credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub nombre: String,
    /// Outstanding debt across all sales.
    pub saldo_pendiente: f64,
    /// Lifetime purchases (shrinks on returns and admin deletes).
    pub total_compras: f64,
    pub created_at: DateTime<Utc>,
    pub metrics: ClientMetrics,
    version: u64,
}

impl Client {
    pub fn new(id: ClientId, nombre: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            nombre: nombre.into(),
            saldo_pendiente: 0.0,
            total_compras: 0.0,
            created_at,
            metrics: ClientMetrics::default(),
            version: 0,
        }
    }

    /// Book a new sale: total purchases grow by the sale total, the balance
    /// by whatever was not paid up front.
    pub fn add_purchase(&mut self, total: f64, unpaid: f64) -> DomainResult<()> {
        if total < 0.0 || unpaid < 0.0 {
            return Err(DomainError::validation("purchase amounts cannot be negative"));
        }
        self.total_compras += total;
        self.saldo_pendiente += unpaid;
        Ok(())
    }

    /// An abono against any of the client's sales.
    pub fn register_payment(&mut self, monto: f64) -> DomainResult<()> {
        if monto < 0.0 {
            return Err(DomainError::validation("payment cannot be negative"));
        }
        self.saldo_pendiente = (self.saldo_pendiente - monto).max(0.0);
        Ok(())
    }

    /// Undo (part of) a sale: `total_reversal` leaves the purchase history,
    /// `balance_reduction` is the unpaid share the client no longer owes.
    pub fn reverse_purchase(&mut self, total_reversal: f64, balance_reduction: f64) -> DomainResult<()> {
        if total_reversal < 0.0 || balance_reduction < 0.0 {
            return Err(DomainError::validation("reversal amounts cannot be negative"));
        }
        self.total_compras = (self.total_compras - total_reversal).max(0.0);
        self.saldo_pendiente = (self.saldo_pendiente - balance_reduction).max(0.0);
        Ok(())
    }
}

impl Entity for Client {
    type Id = ClientId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for Client {
    fn version(&self) -> u64 {
        self.version
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }
}
