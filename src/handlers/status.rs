use axum::{Json, extract::State, http::StatusCode};

use crate::AppState;
use crate::models::status::{ErrorResponse, StatusResponse};

pub async fn hello() -> &'static str {
    "Hello from Price Watcher!"
}

/// Handler for GET /status
pub async fn get_status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let watched_products = state
        .storage
        .count_watched_products(&state.cancel)
        .await
        .map_err(internal_error)?;

    let active_subscribers = state
        .storage
        .list_active_subscribers(&state.cancel)
        .await
        .map_err(internal_error)?
        .len();

    Ok(Json(StatusResponse {
        watched_products,
        active_subscribers,
        configured_urls: state.watch.watched_urls().len(),
        request_interval_minutes: state.watch.effective_interval_minutes(),
        notify_on_every_pull: state.watch.notify_on_every_pull,
        min_change_percentage_to_notify: state.watch.min_change_percentage_to_notify,
    }))
}

pub(crate) fn internal_error<E: std::fmt::Display>(e: E) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("Status API storage error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}
