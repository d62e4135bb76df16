//! Ledger events, one per committed mutation.
//!
//! Published after commit, consumed by the derived-metrics pipeline. Each
//! payload carries the ids of every entity the mutation touched, so handlers
//! know exactly what to recompute without re-deriving the write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gyaledger_banks::BankId;
use gyaledger_events::Event;
use gyaledger_parties::{ClientId, DistributorId};
use gyaledger_products::ProductId;
use gyaledger_purchasing::PurchaseOrderId;
use gyaledger_sales::SaleId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleCreated {
    pub sale_id: SaleId,
    pub client_id: ClientId,
    pub product_id: Option<ProductId>,
    pub purchase_order_id: PurchaseOrderId,
    pub distributor_id: DistributorId,
    pub bank_ids: [BankId; 3],
    pub total: f64,
    pub monto_pagado: f64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbonoRegistered {
    pub sale_id: SaleId,
    pub client_id: ClientId,
    pub product_id: Option<ProductId>,
    pub purchase_order_id: PurchaseOrderId,
    pub bank_ids: [BankId; 3],
    pub monto: f64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnProcessed {
    pub sale_id: SaleId,
    pub client_id: ClientId,
    pub product_id: Option<ProductId>,
    pub purchase_order_id: PurchaseOrderId,
    pub bank_ids: [BankId; 3],
    pub monto_revertido: f64,
    pub reembolso: f64,
    pub es_total: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleCorrected {
    pub sale_id: SaleId,
    pub client_id: ClientId,
    pub product_id: Option<ProductId>,
    pub purchase_order_id: PurchaseOrderId,
    pub bank_ids: [BankId; 3],
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDeleted {
    pub sale_id: SaleId,
    pub client_id: ClientId,
    pub product_id: Option<ProductId>,
    pub purchase_order_id: PurchaseOrderId,
    pub bank_ids: [BankId; 3],
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferExecuted {
    pub origen: BankId,
    pub destino: BankId,
    pub monto: f64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributorPaid {
    pub purchase_order_id: PurchaseOrderId,
    pub distributor_id: DistributorId,
    pub bank_id: BankId,
    pub monto: f64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    SaleCreated(SaleCreated),
    AbonoRegistered(AbonoRegistered),
    ReturnProcessed(ReturnProcessed),
    SaleCorrected(SaleCorrected),
    SaleDeleted(SaleDeleted),
    TransferExecuted(TransferExecuted),
    DistributorPaid(DistributorPaid),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::SaleCreated(_) => "ledger.sale.created",
            LedgerEvent::AbonoRegistered(_) => "ledger.abono.registered",
            LedgerEvent::ReturnProcessed(_) => "ledger.devolucion.processed",
            LedgerEvent::SaleCorrected(_) => "ledger.sale.corrected",
            LedgerEvent::SaleDeleted(_) => "ledger.sale.deleted",
            LedgerEvent::TransferExecuted(_) => "ledger.transfer.executed",
            LedgerEvent::DistributorPaid(_) => "ledger.distributor.paid",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::SaleCreated(e) => e.occurred_at,
            LedgerEvent::AbonoRegistered(e) => e.occurred_at,
            LedgerEvent::ReturnProcessed(e) => e.occurred_at,
            LedgerEvent::SaleCorrected(e) => e.occurred_at,
            LedgerEvent::SaleDeleted(e) => e.occurred_at,
            LedgerEvent::TransferExecuted(e) => e.occurred_at,
            LedgerEvent::DistributorPaid(e) => e.occurred_at,
        }
    }
}
