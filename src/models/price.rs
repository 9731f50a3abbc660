use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Last known price state for one product URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPriceHistory {
    pub id: Uuid,
    pub product_url: String,
    pub last_price: Decimal,
    pub last_check_time: DateTime<Utc>,
}

impl ProductPriceHistory {
    /// Baseline record for a URL seen for the first time.
    pub fn new(product_url: impl Into<String>, last_price: Decimal, last_check_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_url: product_url.into(),
            last_price,
            last_check_time,
        }
    }

    /// Carry the record forward to the outcome of a check, keeping its id.
    pub fn with_check(mut self, result: &PriceCheckResult) -> Self {
        self.last_price = result.new_price;
        self.last_check_time = result.checked_at;
        self
    }
}

/// Outcome of checking one product in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCheckResult {
    pub product_url: String,
    pub old_price: Option<Decimal>,
    pub new_price: Decimal,
    pub changed: bool,
    pub change_rate_percent: f64,
    pub checked_at: DateTime<Utc>,
}

impl PriceCheckResult {
    pub fn new(
        product_url: impl Into<String>,
        old_price: Option<Decimal>,
        new_price: Decimal,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_url: product_url.into(),
            old_price,
            new_price,
            changed: old_price.is_none_or(|old| old != new_price),
            change_rate_percent: calculate_change_rate(old_price, new_price),
            checked_at,
        }
    }
}

/// Signed percentage change from `old_price` to `new_price`.
///
/// Zero when there is no previous price or the previous price is zero. Amounts
/// too large for exact decimal arithmetic are compared in floating point.
pub fn calculate_change_rate(old_price: Option<Decimal>, new_price: Decimal) -> f64 {
    let Some(old) = old_price.filter(|old| !old.is_zero()) else {
        return 0.0;
    };

    let exact = new_price
        .checked_sub(old)
        .and_then(|diff| diff.checked_div(old))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|rate| rate.to_f64());

    exact.unwrap_or_else(|| {
        tracing::warn!(old = %old, new = %new_price, "Change rate overflowed decimal range");
        let (old, new) = (old.to_f64().unwrap_or(0.0), new_price.to_f64().unwrap_or(0.0));
        let rate = (new - old) / old * 100.0;
        if rate.is_finite() { rate } else { 0.0 }
    })
}
