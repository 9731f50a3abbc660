//! Amazon product pages (amazon.com.tr, amazon.com).

use lazy_static::lazy_static;
use scraper::{Html, Selector};

use super::extractor::first_text;

pub const DOMAINS: &[&str] = &["amazon.com.tr", "amazon.com"];

/// Sent on top of the common browser headers; plain requests get a captcha page.
pub const EXTRA_HEADERS: &[(&str, &str)] = &[
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
];

lazy_static! {
    static ref PRICE_SELECTORS: Vec<Selector> = [
        "span#priceblock_ourprice",
        "span#priceblock_dealprice",
        "span#priceblock_saleprice",
        r#"span[data-a-color="price"] > span.a-offscreen"#,
        r#"span[class*="a-price"] > span.a-offscreen"#,
        "span#tp_price_block_total_price_ww > span",
    ]
    .iter()
    .map(|selector| Selector::parse(selector).unwrap())
    .collect();
}

/// Buy-box price blocks, most specific first.
pub fn preferred_price_text(document: &Html) -> Option<String> {
    first_text(document, &PRICE_SELECTORS)
}
