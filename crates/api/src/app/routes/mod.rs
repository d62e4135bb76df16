use axum::Router;

pub mod alerts;
pub mod banks;
pub mod sales;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .merge(sales::router())
        .merge(banks::router())
        .merge(alerts::router())
}
