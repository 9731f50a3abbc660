pub mod amazon;
pub mod extractor;
pub mod hepsiburada;
pub mod normalizer;
pub mod router;
pub mod trendyol;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use scraper::Html;
use tokio_util::sync::CancellationToken;

use crate::error::Cancelled;
use self::normalizer::normalize_price;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";
const TURKISH_ACCEPT_LANGUAGE: &str = "tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7";

/// One supported storefront.
///
/// Variants share the fetch pipeline and differ only in accepted domains, extra
/// request headers and an optional preferred price node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteFetcher {
    Amazon,
    Trendyol,
    Hepsiburada,
}

impl SiteFetcher {
    /// Registration order used by the router.
    pub const ALL: [SiteFetcher; 3] = [SiteFetcher::Amazon, SiteFetcher::Trendyol, SiteFetcher::Hepsiburada];

    pub fn name(self) -> &'static str {
        match self {
            SiteFetcher::Amazon => "amazon",
            SiteFetcher::Trendyol => "trendyol",
            SiteFetcher::Hepsiburada => "hepsiburada",
        }
    }

    pub fn domains(self) -> &'static [&'static str] {
        match self {
            SiteFetcher::Amazon => amazon::DOMAINS,
            SiteFetcher::Trendyol => trendyol::DOMAINS,
            SiteFetcher::Hepsiburada => hepsiburada::DOMAINS,
        }
    }

    fn extra_headers(self) -> &'static [(&'static str, &'static str)] {
        match self {
            SiteFetcher::Amazon => amazon::EXTRA_HEADERS,
            SiteFetcher::Trendyol => &[],
            SiteFetcher::Hepsiburada => hepsiburada::EXTRA_HEADERS,
        }
    }

    /// True when the URL host is one of this site's domains or a subdomain of one.
    pub fn can_handle(self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };

        let host = host.to_ascii_lowercase();
        self.domains()
            .iter()
            .any(|domain| host == *domain || host.strip_suffix(domain).is_some_and(|rest| rest.ends_with('.')))
    }

    /// Browser-like headers plus this site's extras; extras win on conflict.
    pub fn request_headers(self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(TURKISH_ACCEPT_LANGUAGE));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        for (name, value) in self.extra_headers() {
            headers.insert(HeaderName::from_static(*name), HeaderValue::from_static(*value));
        }

        headers
    }

    /// Site-specific price node, if this site has one.
    pub fn preferred_price_text(self, document: &Html) -> Option<String> {
        match self {
            SiteFetcher::Amazon => amazon::preferred_price_text(document),
            SiteFetcher::Trendyol => trendyol::preferred_price_text(document),
            SiteFetcher::Hepsiburada => None,
        }
    }

    pub fn extract_price_text(self, document: &Html) -> Option<String> {
        self.preferred_price_text(document)
            .or_else(|| extractor::extract_price_text(document))
    }

    /// Extract and normalize the price from a fetched page.
    pub fn parse_price(self, url: &str, html: &str) -> Option<Decimal> {
        let document = Html::parse_document(html);

        let Some(price_text) = self.extract_price_text(&document) else {
            tracing::warn!(url = %url, site = self.name(), "Price element could not be found");
            return None;
        };

        match normalize_price(&price_text) {
            Ok(price) => Some(price),
            Err(e) => {
                tracing::warn!(url = %url, site = self.name(), error = %e, "Price text could not be parsed");
                None
            }
        }
    }

    /// Download the page and read its price.
    ///
    /// Transport faults, non-success statuses and extraction failures are logged
    /// and yield `Ok(None)`; only cancellation is an error.
    pub async fn fetch_price(
        self,
        client: &Client,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Decimal>, Cancelled> {
        let request = client.get(url).headers(self.request_headers());

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Cancelled),
            response = request.send() => response,
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Failed to fetch product page");
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            tracing::warn!(url = %url, status = %response.status(), "Failed to fetch price");
            return Ok(None);
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Cancelled),
            body = response.text() => body,
        };

        match body {
            Ok(html) => Ok(self.parse_price(url, &html)),
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Failed to read product page");
                Ok(None)
            }
        }
    }
}
