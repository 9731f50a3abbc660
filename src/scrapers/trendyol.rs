//! Trendyol product pages.

use lazy_static::lazy_static;
use scraper::{Html, Selector};

use super::extractor::first_text;

pub const DOMAINS: &[&str] = &["trendyol.com"];

lazy_static! {
    // Discounted price first, then the current-price test hook of the newer layout
    static ref PRICE_SELECTORS: Vec<Selector> = vec![
        Selector::parse(r#"span[class*="prc-dsc"]"#).unwrap(),
        Selector::parse(r#"[data-testid="price-current-price"]"#).unwrap(),
    ];
}

pub fn preferred_price_text(document: &Html) -> Option<String> {
    first_text(document, &PRICE_SELECTORS)
}
