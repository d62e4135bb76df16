use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use gyaledger_banks::BankId;
use gyaledger_core::EntityId;
use gyaledger_engine::bank_overview;
use gyaledger_purchasing::PurchaseOrderId;

use crate::app::dto::{PayDistributorRequest, TransferRequest};
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/banks", get(list_banks))
        .route("/transfers", post(transfer))
        .route("/purchase-orders/:id/payments", post(pay_distributor))
}

fn parse_entity_id(raw: &str, what: &'static str) -> Result<EntityId, axum::response::Response> {
    raw.parse::<EntityId>().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("invalid {what}"),
        )
    })
}

pub async fn list_banks(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let banks = bank_overview(&services.store);
    (StatusCode::OK, Json(banks)).into_response()
}

pub async fn transfer(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<TransferRequest>,
) -> axum::response::Response {
    let origen = match parse_entity_id(&body.banco_origen_id, "bancoOrigenId") {
        Ok(id) => BankId::new(id),
        Err(resp) => return resp,
    };
    let destino = match parse_entity_id(&body.banco_destino_id, "bancoDestinoId") {
        Ok(id) => BankId::new(id),
        Err(resp) => return resp,
    };

    match services.engine.transfer(origen, destino, body.monto, None) {
        Ok(outcome) => {
            services.sales_cache.invalidate();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "movimientoSalida": outcome.movimiento_salida.to_string(),
                    "movimientoEntrada": outcome.movimiento_entrada.to_string(),
                })),
            )
                .into_response()
        }
        Err(err) => errors::domain_error_to_response(err),
    }
}

pub async fn pay_distributor(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<PayDistributorRequest>,
) -> axum::response::Response {
    let order_id = match parse_entity_id(&id, "purchase order id") {
        Ok(id) => PurchaseOrderId::new(id),
        Err(resp) => return resp,
    };
    let bank_id = match parse_entity_id(&body.banco_origen_id, "bancoOrigenId") {
        Ok(id) => BankId::new(id),
        Err(resp) => return resp,
    };

    match services.engine.pay_distributor(order_id, body.monto, bank_id, None) {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "saldoOrden": outcome.saldo_orden,
                "capitalRestante": outcome.capital_restante,
            })),
        )
            .into_response(),
        Err(err) => errors::domain_error_to_response(err),
    }
}
