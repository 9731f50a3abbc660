use axum::{Json, extract::State, http::StatusCode};

use super::status::internal_error;
use crate::AppState;
use crate::models::status::{ErrorResponse, PriceHistoryResponse};

/// Handler for GET /prices
/// Last known price of every watched product, ordered by URL
pub async fn get_prices(
    State(state): State<AppState>,
) -> Result<Json<Vec<PriceHistoryResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let histories = state
        .storage
        .list_price_histories(&state.cancel)
        .await
        .map_err(internal_error)?;

    Ok(Json(histories.into_iter().map(PriceHistoryResponse::from).collect()))
}
