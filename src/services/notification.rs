use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::Cancelled;
use crate::models::price::PriceCheckResult;
use crate::services::price_storage::{PriceStorage, StorageError};
use crate::services::telegram::{TelegramClient, TelegramError};

/// Outcome of one fan-out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Best-effort delivery to every active subscriber.
    async fn notify_price_change(
        &self,
        result: &PriceCheckResult,
        cancel: &CancellationToken,
    ) -> Result<DeliveryReport, Cancelled>;

    /// Best-effort delivery to the admin chat; `Ok(false)` if nothing was sent.
    async fn notify_admin(&self, message: &str, cancel: &CancellationToken) -> Result<bool, Cancelled>;
}

pub struct TelegramNotifier<S> {
    telegram: TelegramClient,
    storage: Arc<S>,
    admin_chat_id: Option<i64>,
}

impl<S: PriceStorage> TelegramNotifier<S> {
    pub fn new(telegram: TelegramClient, storage: Arc<S>, admin_chat_id: Option<i64>) -> Self {
        Self {
            telegram,
            storage,
            admin_chat_id,
        }
    }
}

#[async_trait]
impl<S: PriceStorage> Notifier for TelegramNotifier<S> {
    async fn notify_price_change(
        &self,
        result: &PriceCheckResult,
        cancel: &CancellationToken,
    ) -> Result<DeliveryReport, Cancelled> {
        let subscribers = match self.storage.list_active_subscribers(cancel).await {
            Ok(subscribers) => subscribers,
            Err(StorageError::Cancelled) => return Err(Cancelled),
            Err(e) => {
                error!(error = %e, "Failed to load subscribers; notification dropped");
                return Ok(DeliveryReport::default());
            }
        };

        let message = build_price_message(result);
        let mut report = DeliveryReport::default();

        for subscriber in subscribers {
            match self.telegram.send_message(subscriber.chat_id, &message, cancel).await {
                Ok(()) => report.delivered += 1,
                Err(TelegramError::Cancelled) => return Err(Cancelled),
                Err(e) => {
                    error!(chat_id = subscriber.chat_id, error = %e, "Failed to send notification");
                    report.failed += 1;
                }
            }
        }

        info!(
            url = %result.product_url,
            delivered = report.delivered,
            failed = report.failed,
            "Price notification dispatched"
        );
        Ok(report)
    }

    async fn notify_admin(&self, message: &str, cancel: &CancellationToken) -> Result<bool, Cancelled> {
        let Some(chat_id) = self.admin_chat_id else {
            warn!("Admin chat id is not configured; cannot send admin message");
            return Ok(false);
        };

        match self.telegram.send_message(chat_id, message, cancel).await {
            Ok(()) => Ok(true),
            Err(TelegramError::Cancelled) => Err(Cancelled),
            Err(e) => {
                error!(chat_id = chat_id, error = %e, "Failed to send admin message");
                Ok(false)
            }
        }
    }
}

/// Human-readable change notice.
pub fn build_price_message(result: &PriceCheckResult) -> String {
    let old_price = result
        .old_price
        .map(|price| format!("{} TL", format_try(price)))
        .unwrap_or_else(|| "-".to_string());
    let sign = if result.change_rate_percent >= 0.0 { "+" } else { "" };

    format!(
        "Price update\nProduct: {}\nOld price: {}\nNew price: {} TL\nChange: {}{:.2}%\nDate: {}\n",
        result.product_url,
        old_price,
        format_try(result.new_price),
        sign,
        result.change_rate_percent,
        result.checked_at.format("%d.%m.%Y %H:%M:%S"),
    )
}

/// Two decimals with Turkish grouping: `36499` -> `36.499,00`.
pub fn format_try(price: Decimal) -> String {
    let fixed = format!("{:.2}", price.round_dp(2));
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{}{},{}", sign, grouped, fraction)
}
