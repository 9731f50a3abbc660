mod common;

use std::time::Duration;

use axum::{Router, http::HeaderMap, http::StatusCode, response::Html, routing::get};
use price_watcher::error::Cancelled;
use price_watcher::scrapers::SiteFetcher;
use price_watcher::scrapers::router::{PriceRouter, PriceSource};
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

use crate::common::spawn_server;

const TRENDYOL_PAGE: &str = r#"<html><body>
    <div class="product-price-container">
        <span class="prc-org">45.999 TL</span>
        <span class="prc-dsc">36.499,00 TL</span>
    </div>
</body></html>"#;

const JSON_LD_PAGE: &str = r#"<html><head>
    <script type="application/ld+json">
        {"@type": "Product", "name": "Kulaklik", "offers": {"@type": "Offer", "price": "1299.90", "priceCurrency": "TRY"}}
    </script>
</head><body><p>Kargo bedava</p></body></html>"#;

const NO_PRICE_PAGE: &str = "<html><body><h1>Stokta yok</h1></body></html>";

async fn product_server() -> String {
    let router = Router::new()
        .route("/trendyol", get(|| async { Html(TRENDYOL_PAGE) }))
        .route("/json-ld", get(|| async { Html(JSON_LD_PAGE) }))
        .route("/no-price", get(|| async { Html(NO_PRICE_PAGE) }))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "not found") }))
        .route(
            "/headers",
            get(|headers: HeaderMap| async move {
                let language = headers
                    .get("accept-language")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if language.starts_with("tr-TR") {
                    Html(r#"<span class="price">19,90 TL</span>"#)
                } else {
                    Html(NO_PRICE_PAGE)
                }
            }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Html(TRENDYOL_PAGE)
            }),
        );

    format!("http://{}", spawn_server(router).await)
}

#[tokio::test]
async fn test_site_override_reads_discounted_price() {
    let base = product_server().await;
    let client = reqwest::Client::new();

    let price = SiteFetcher::Trendyol
        .fetch_price(&client, &format!("{}/trendyol", base), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(price, Some(dec!(36499.00)));
}

#[tokio::test]
async fn test_structured_data_price() {
    let base = product_server().await;
    let client = reqwest::Client::new();

    let price = SiteFetcher::Hepsiburada
        .fetch_price(&client, &format!("{}/json-ld", base), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(price, Some(dec!(1299.90)));
}

#[tokio::test]
async fn test_browser_headers_are_sent() {
    let base = product_server().await;
    let client = reqwest::Client::new();

    let price = SiteFetcher::Amazon
        .fetch_price(&client, &format!("{}/headers", base), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(price, Some(dec!(19.90)));
}

#[tokio::test]
async fn test_page_without_price_yields_none() {
    let base = product_server().await;
    let client = reqwest::Client::new();

    let price = SiteFetcher::Trendyol
        .fetch_price(&client, &format!("{}/no-price", base), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(price, None);
}

#[tokio::test]
async fn test_non_success_status_yields_none() {
    let base = product_server().await;
    let client = reqwest::Client::new();

    let price = SiteFetcher::Trendyol
        .fetch_price(&client, &format!("{}/missing", base), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(price, None);
}

#[tokio::test]
async fn test_connection_failure_yields_none() {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    // Bind and immediately drop a listener so the port is closed
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let price = SiteFetcher::Amazon
        .fetch_price(&client, &format!("http://{}/dp/B0", addr), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(price, None);
}

#[tokio::test]
async fn test_cancellation_interrupts_fetch() {
    let base = product_server().await;
    let client = reqwest::Client::new();
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        SiteFetcher::Trendyol.fetch_price(&client, &format!("{}/slow", base), &cancel),
    )
    .await
    .expect("fetch should stop once cancelled");

    assert_eq!(result, Err(Cancelled));
}

#[tokio::test]
async fn test_router_reports_no_fetcher_for_local_host() {
    let base = product_server().await;
    let router = PriceRouter::with_fetchers(reqwest::Client::new(), SiteFetcher::ALL.to_vec());

    // The local server would answer, but no storefront claims its host
    let price = router
        .fetch_price(&format!("{}/trendyol", base), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(price, None);
}
