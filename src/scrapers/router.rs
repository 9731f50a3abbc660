use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use super::SiteFetcher;
use crate::error::Cancelled;

/// Anything that can report the current price of a product URL.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// `Ok(None)` means "no price this time"; the caller skips the URL for this cycle.
    async fn fetch_price(&self, url: &str, cancel: &CancellationToken) -> Result<Option<Decimal>, Cancelled>;
}

/// Dispatches a URL to the first registered site fetcher that accepts it.
pub struct PriceRouter {
    client: Client,
    fetchers: Vec<SiteFetcher>,
}

impl PriceRouter {
    /// Router over every supported site, sharing one HTTP client.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self::with_fetchers(client, SiteFetcher::ALL.to_vec()))
    }

    pub fn with_fetchers(client: Client, fetchers: Vec<SiteFetcher>) -> Self {
        Self { client, fetchers }
    }

    pub fn select(&self, url: &str) -> Option<SiteFetcher> {
        self.fetchers.iter().copied().find(|fetcher| fetcher.can_handle(url))
    }
}

#[async_trait]
impl PriceSource for PriceRouter {
    async fn fetch_price(&self, url: &str, cancel: &CancellationToken) -> Result<Option<Decimal>, Cancelled> {
        let Some(fetcher) = self.select(url) else {
            tracing::warn!(url = %url, "No price fetcher available");
            return Ok(None);
        };

        tracing::info!("Using {} fetcher for {}", fetcher.name(), url);
        fetcher.fetch_price(&self.client, url, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_host() {
        let router = PriceRouter::with_fetchers(Client::new(), SiteFetcher::ALL.to_vec());

        assert_eq!(router.select("https://www.amazon.com.tr/dp/B0"), Some(SiteFetcher::Amazon));
        assert_eq!(router.select("https://www.trendyol.com/x-p-1"), Some(SiteFetcher::Trendyol));
        assert_eq!(router.select("https://www.hepsiburada.com/x-p-HB1"), Some(SiteFetcher::Hepsiburada));
        assert_eq!(router.select("https://www.n11.com/urun/x"), None);
    }

    #[test]
    fn test_only_registered_fetchers_are_used() {
        let router = PriceRouter::with_fetchers(Client::new(), vec![SiteFetcher::Trendyol]);

        assert_eq!(router.select("https://www.amazon.com.tr/dp/B0"), None);
        assert_eq!(router.select("https://www.trendyol.com/x-p-1"), Some(SiteFetcher::Trendyol));
    }

    #[tokio::test]
    async fn test_unmatched_url_is_not_an_error() {
        let router = PriceRouter::with_fetchers(Client::new(), SiteFetcher::ALL.to_vec());
        let cancel = CancellationToken::new();

        let price = router.fetch_price("https://www.n11.com/urun/x", &cancel).await;

        assert_eq!(price, Ok(None));
    }
}
