use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::price::ProductPriceHistory;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub watched_products: u64,
    pub active_subscribers: usize,
    pub configured_urls: usize,
    pub request_interval_minutes: u64,
    pub notify_on_every_pull: bool,
    pub min_change_percentage_to_notify: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryResponse {
    pub id: String,
    pub product_url: String,
    pub last_price: Decimal,
    pub last_check_time: DateTime<Utc>,
}

impl From<ProductPriceHistory> for PriceHistoryResponse {
    fn from(history: ProductPriceHistory) -> Self {
        Self {
            id: history.id.to_string(),
            product_url: history.product_url,
            last_price: history.last_price,
            last_check_time: history.last_check_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
