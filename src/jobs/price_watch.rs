use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::WatchSettings;
use crate::error::{Cancelled, WatchError};
use crate::models::price::{PriceCheckResult, ProductPriceHistory};
use crate::scrapers::router::PriceSource;
use crate::services::notification::Notifier;
use crate::services::price_storage::PriceStorage;

/// What happened to one URL during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCheck {
    pub result: PriceCheckResult,
    pub notified: bool,
}

/// Per-cycle tally.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub checked: usize,
    pub skipped: usize,
    pub notified: usize,
}

pub struct PriceWatcher<P: ?Sized, S: ?Sized, N: ?Sized> {
    source: Arc<P>,
    storage: Arc<S>,
    notifier: Arc<N>,
    settings: WatchSettings,
}

impl<P, S, N> PriceWatcher<P, S, N>
where
    P: PriceSource + ?Sized,
    S: PriceStorage + ?Sized,
    N: Notifier + ?Sized,
{
    pub fn new(source: Arc<P>, storage: Arc<S>, notifier: Arc<N>, settings: WatchSettings) -> Self {
        Self {
            source,
            storage,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &WatchSettings {
        &self.settings
    }

    /// Run cycles until `cancel` fires. Cancellation is a normal exit.
    pub async fn run(&self, cancel: &CancellationToken) {
        info!(
            urls = self.settings.watched_urls().len(),
            interval_minutes = self.settings.effective_interval_minutes(),
            "Price watch loop started"
        );

        loop {
            match self.run_cycle(cancel).await {
                Ok(summary) => info!(
                    checked = summary.checked,
                    skipped = summary.skipped,
                    notified = summary.notified,
                    "Price watch cycle complete"
                ),
                Err(Cancelled) => break,
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.interval()) => {}
            }
        }

        info!("Price watch loop stopped");
    }

    /// Check every configured URL once, strictly in order.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleSummary, Cancelled> {
        let mut summary = CycleSummary::default();

        for url in self.settings.watched_urls() {
            match self.check_product(url, cancel).await {
                Ok(Some(check)) => {
                    summary.checked += 1;
                    if check.notified {
                        summary.notified += 1;
                    }
                }
                Ok(None) => summary.skipped += 1,
                Err(WatchError::Cancelled) => {
                    debug!(url = %url, "Price watch cycle cancelled");
                    return Err(Cancelled);
                }
                Err(WatchError::Storage(e)) => {
                    error!(url = %url, error = %e, "Storage failure while checking product");
                    summary.skipped += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Fetch, compare, persist and (maybe) notify for one URL.
    ///
    /// `Ok(None)` when no price could be obtained this cycle.
    pub async fn check_product(&self, url: &str, cancel: &CancellationToken) -> Result<Option<ProductCheck>, WatchError> {
        let Some(new_price) = self.source.fetch_price(url, cancel).await? else {
            warn!(url = %url, "No price obtained, skipping this cycle");
            return Ok(None);
        };

        let existing = self.storage.get_last_price(url, cancel).await?;
        let result = PriceCheckResult::new(url, existing.as_ref().map(|h| h.last_price), new_price, Utc::now());
        let notify = should_notify(&self.settings, &result, existing.is_some());

        // Persisted before dispatch; a failed delivery never rolls this back
        let history = match existing {
            Some(history) => history.with_check(&result),
            None => ProductPriceHistory::new(url, result.new_price, result.checked_at),
        };
        self.storage.upsert_price(&history, cancel).await?;

        debug!(
            url = %url,
            price = %result.new_price,
            changed = result.changed,
            change_rate = result.change_rate_percent,
            notify = notify,
            "Product checked"
        );

        if notify {
            self.notifier.notify_price_change(&result, cancel).await?;
        }

        Ok(Some(ProductCheck { result, notified: notify }))
    }
}

/// Notification rule for a single check.
pub fn should_notify(settings: &WatchSettings, result: &PriceCheckResult, had_history: bool) -> bool {
    if settings.notify_on_every_pull {
        return true;
    }
    if !had_history {
        return false;
    }
    result.change_rate_percent.abs() >= settings.min_change_percentage_to_notify
}

pub fn start_price_watch_job<P, S, N>(watcher: PriceWatcher<P, S, N>, cancel: CancellationToken) -> JoinHandle<()>
where
    P: PriceSource + ?Sized + 'static,
    S: PriceStorage + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    tokio::spawn(async move {
        watcher.run(&cancel).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settings(threshold: f64, every_pull: bool) -> WatchSettings {
        WatchSettings {
            product_urls: vec![],
            request_interval_minutes: 5,
            notify_on_every_pull: every_pull,
            min_change_percentage_to_notify: threshold,
        }
    }

    #[test]
    fn test_notify_when_change_reaches_threshold() {
        let result = PriceCheckResult::new("u", Some(dec!(100.00)), dec!(110.00), Utc::now());
        assert!(should_notify(&settings(5.0, false), &result, true));

        let exact = PriceCheckResult::new("u", Some(dec!(100.00)), dec!(95.00), Utc::now());
        assert!(should_notify(&settings(5.0, false), &exact, true));
    }

    #[test]
    fn test_no_notify_below_threshold() {
        let result = PriceCheckResult::new("u", Some(dec!(100.00)), dec!(102.00), Utc::now());
        assert!(!should_notify(&settings(5.0, false), &result, true));
    }

    #[test]
    fn test_first_observation_is_silent() {
        let result = PriceCheckResult::new("u", None, dec!(50.00), Utc::now());
        assert!(result.changed);
        assert!(!should_notify(&settings(0.0, false), &result, false));
    }

    #[test]
    fn test_every_pull_always_notifies() {
        let unchanged = PriceCheckResult::new("u", Some(dec!(100)), dec!(100), Utc::now());
        assert!(should_notify(&settings(5.0, true), &unchanged, true));

        let first = PriceCheckResult::new("u", None, dec!(100), Utc::now());
        assert!(should_notify(&settings(5.0, true), &first, false));
    }
}
