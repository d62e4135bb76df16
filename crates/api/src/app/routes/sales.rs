use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use gyaledger_core::EntityId;
use gyaledger_engine::{list_sales as query_sales, CreateSaleInput};
use gyaledger_parties::ClientId;
use gyaledger_products::ProductId;
use gyaledger_purchasing::PurchaseOrderId;
use gyaledger_sales::SaleId;

use crate::app::errors;
use crate::app::dto::{
    CreateSaleRequest, CreateSaleResponse, DeleteSaleQuery, SalesQuery, UpdateSaleRequest,
    UpdateSaleResponse,
};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route(
        "/sales",
        get(list_sales)
            .post(create_sale)
            .put(update_sale)
            .delete(delete_sale),
    )
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

pub async fn list_sales(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<SalesQuery>,
) -> axum::response::Response {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20);

    if let Some(cached) = services.sales_cache.get(page, per_page) {
        return (StatusCode::OK, Json(cached)).into_response();
    }

    let result = query_sales(&services.store, page, per_page);
    let value = match serde_json::to_value(&result) {
        Ok(v) => v,
        Err(err) => {
            tracing::error!(error = %err, "sales read model serialization failed");
            return errors::internal_error("sales serialization");
        }
    };

    services.sales_cache.put(page, per_page, value.clone());
    (StatusCode::OK, Json(value)).into_response()
}

pub async fn create_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CreateSaleRequest>,
) -> axum::response::Response {
    let client_id = match parse_entity_id(&body.cliente_id, "clienteId") {
        Ok(id) => ClientId::new(id),
        Err(resp) => return resp,
    };
    let purchase_order_id = match parse_entity_id(&body.oc_relacionada, "ocRelacionada") {
        Ok(id) => PurchaseOrderId::new(id),
        Err(resp) => return resp,
    };
    let product_id = match &body.producto_id {
        Some(raw) => match parse_entity_id(raw, "productoId") {
            Ok(id) => Some(ProductId::new(id)),
            Err(resp) => return resp,
        },
        None => None,
    };

    let outcome = match services.engine.create_sale(CreateSaleInput {
        client_id,
        purchase_order_id,
        product_id,
        cantidad: body.cantidad,
        precio_venta_unidad: body.precio_venta_unidad,
        precio_compra_unidad: body.precio_compra_unidad,
        precio_flete_unidad: body.precio_flete,
        monto_pagado: body.monto_pagado,
        actor: None,
    }) {
        Ok(outcome) => outcome,
        Err(err) => return errors::domain_error_to_response(err),
    };

    services.sales_cache.invalidate();

    (
        StatusCode::CREATED,
        Json(CreateSaleResponse {
            venta_id: outcome.sale_id.to_string(),
            distribucion: outcome.distribucion,
            estado_pago: outcome.estado_pago,
            total_venta: outcome.total_venta,
        }),
    )
        .into_response()
}

pub async fn update_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<UpdateSaleRequest>,
) -> axum::response::Response {
    let sale_id = match parse_entity_id(&body.venta_id, "ventaId") {
        Ok(id) => SaleId::new(id),
        Err(resp) => return resp,
    };

    // Admin split correction takes precedence; otherwise an incremental
    // payment is treated as an abono.
    if let Some(distribucion) = body.distribucion_gya {
        if let Err(err) = services
            .engine
            .correct_sale_split(sale_id, distribucion, Some("admin".to_string()))
        {
            return errors::domain_error_to_response(err);
        }
    } else if let Some(monto) = body.monto_pagado {
        if let Err(err) = services.engine.register_abono(sale_id, monto, None) {
            return errors::domain_error_to_response(err);
        }
    } else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "either montoPagado or distribucionGYA is required",
        );
    }

    services.sales_cache.invalidate();

    let Some(sale) = services.store.sale(sale_id) else {
        return errors::internal_error("updated sale disappeared");
    };
    (
        StatusCode::OK,
        Json(UpdateSaleResponse {
            venta_id: sale.id.to_string(),
            monto_pagado: sale.monto_pagado,
            monto_restante: sale.monto_restante,
            estado_pago: sale.estado_pago,
        }),
    )
        .into_response()
}

pub async fn delete_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<DeleteSaleQuery>,
) -> axum::response::Response {
    let sale_id = match parse_entity_id(&params.id, "id") {
        Ok(id) => SaleId::new(id),
        Err(resp) => return resp,
    };

    if let Err(err) = services.engine.delete_sale(sale_id, Some("admin".to_string())) {
        return errors::domain_error_to_response(err);
    }

    services.sales_cache.invalidate();
    (StatusCode::OK, Json(serde_json::json!({"deleted": params.id}))).into_response()
}
