//! Site-independent price text extraction.
//!
//! Tried in order, first hit wins:
//! 1. `"price"` fields inside JSON-LD script blocks
//! 2. `span`/`div`/`ins`/`meta` elements whose class, id or data-testid carries a price hint
//! 3. `meta` tags declaring `itemprop="price"` or a product/og price amount
//!
//! Step 2 keeps the candidate with the largest numeric value. Pages often show a
//! struck-through list price next to the sale price, so this can pick the wrong one
//! (or an unrelated larger badge such as a shipping fee). Sites with a known live
//! price node should override it through `SiteFetcher::preferred_price_text`.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};

use super::normalizer::normalize_price;

lazy_static! {
    static ref JSON_LD_PRICE_REGEX: Regex =
        Regex::new(r#"(?i)"price"\s*:\s*"?([\d.,\s]+)"?"#).unwrap();
    static ref JSON_LD_SELECTOR: Selector =
        Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
    static ref HINTED_TAG_SELECTOR: Selector = Selector::parse("span, div, ins, meta").unwrap();
    static ref META_PRICE_SELECTOR: Selector = Selector::parse(
        r#"meta[itemprop="price"], meta[property="product:price:amount"], meta[property="og:price:amount"]"#
    )
    .unwrap();
}

/// Attribute substrings conventionally used on price markup.
const PRICE_HINTS: &[&str] = &["price", "amount", "value", "fiyat", "prc", "amt"];

/// Attributes inspected for price hints.
const HINT_ATTRIBUTES: &[&str] = &["class", "id", "data-testid"];

/// Locate the most plausible raw price text in `document`.
pub fn extract_price_text(document: &Html) -> Option<String> {
    structured_data_price(document)
        .or_else(|| hinted_element_price(document))
        .or_else(|| meta_price(document))
}

/// Raw `"price"` value from the first JSON-LD block that has one.
pub fn structured_data_price(document: &Html) -> Option<String> {
    document.select(&JSON_LD_SELECTOR).find_map(|script| {
        let json = script.text().collect::<String>();
        JSON_LD_PRICE_REGEX
            .captures(&json)
            .map(|cap| {
                cap[1]
                    .trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace())
                    .trim_end_matches(',')
                    .to_string()
            })
            .filter(|value| !value.is_empty())
    })
}

/// Largest numeric candidate among price-hinted elements.
///
/// When no candidate parses, the first one is returned so the caller can still
/// report the offending text.
pub fn hinted_element_price(document: &Html) -> Option<String> {
    let mut best: Option<(Decimal, String)> = None;
    let mut first_unparsed: Option<String> = None;

    for element in document.select(&HINTED_TAG_SELECTOR) {
        if !has_price_hint_attribute(&element) {
            continue;
        }

        let Some(candidate) = candidate_text(&element) else {
            continue;
        };

        match normalize_price(&candidate) {
            Ok(price) => {
                if best.as_ref().is_none_or(|(best_price, _)| price > *best_price) {
                    best = Some((price, candidate));
                }
            }
            Err(_) => {
                if first_unparsed.is_none() {
                    first_unparsed = Some(candidate);
                }
            }
        }
    }

    best.map(|(_, text)| text).or(first_unparsed)
}

/// `content` of the first non-empty price meta tag.
pub fn meta_price(document: &Html) -> Option<String> {
    document
        .select(&META_PRICE_SELECTOR)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

/// Trimmed inner text of the first element matching any selector, in order.
pub fn first_text(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        document
            .select(selector)
            .map(|element| element_text(&element))
            .find(|text| !text.is_empty())
    })
}

pub fn has_price_hint(value: &str) -> bool {
    if value.trim().is_empty() {
        return false;
    }

    let lower = value.to_lowercase();
    PRICE_HINTS.iter().any(|hint| lower.contains(hint))
}

fn has_price_hint_attribute(element: &ElementRef) -> bool {
    HINT_ATTRIBUTES
        .iter()
        .filter_map(|name| element.value().attr(name))
        .any(has_price_hint)
}

/// Candidate text of a hinted element; only texts containing a digit qualify.
fn candidate_text(element: &ElementRef) -> Option<String> {
    let text = if element.value().name() == "meta" {
        element.value().attr("content").unwrap_or_default().trim().to_string()
    } else {
        element_text(element)
    };

    text.chars().any(|c| c.is_ascii_digit()).then_some(text)
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
