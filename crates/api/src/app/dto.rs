//! Request/response DTOs.
//!
//! The wire vocabulary is the dashboard's: Spanish field names in camelCase
//! (`clienteId`, `ocRelacionada`, `montoPagado`, ...).

use serde::{Deserialize, Serialize};

use gyaledger_distribution::GyaSplit;
use gyaledger_sales::PaymentStatus;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    pub cliente_id: String,
    pub producto_id: Option<String>,
    pub cantidad: u32,
    pub precio_venta_unidad: f64,
    pub precio_compra_unidad: Option<f64>,
    pub precio_flete: Option<f64>,
    pub monto_pagado: Option<f64>,
    pub oc_relacionada: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleResponse {
    pub venta_id: String,
    pub distribucion: GyaSplit,
    pub estado_pago: PaymentStatus,
    pub total_venta: f64,
}

/// `PUT /sales`: either an incremental payment (abono) or an admin
/// correction of the historic split. Exactly one must be present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSaleRequest {
    pub venta_id: String,
    pub monto_pagado: Option<f64>,
    #[serde(rename = "distribucionGYA")]
    pub distribucion_gya: Option<GyaSplit>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSaleResponse {
    pub venta_id: String,
    pub monto_pagado: f64,
    pub monto_restante: f64,
    pub estado_pago: PaymentStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSaleQuery {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub banco_origen_id: String,
    pub banco_destino_id: String,
    pub monto: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayDistributorRequest {
    pub monto: f64,
    pub banco_origen_id: String,
}
