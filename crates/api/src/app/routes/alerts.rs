use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/alerts", get(list_alerts))
        .route("/alerts/scan", post(run_scan))
}

pub async fn list_alerts(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let alerts = services.store.list_alerts();
    (StatusCode::OK, Json(alerts)).into_response()
}

/// Trigger a scan on demand (the scheduler collaborator calls this).
pub async fn run_scan(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let changes = services.scanner.run_once(Utc::now());
    (StatusCode::OK, Json(serde_json::json!({"changes": changes}))).into_response()
}
