use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod prices;
pub mod status;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status::hello))
        .route("/status", get(status::get_status))
        .route("/prices", get(prices::get_prices))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
