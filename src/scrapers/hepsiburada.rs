//! Hepsiburada product pages. No dedicated price node; the generic extractor handles them.

pub const DOMAINS: &[&str] = &["hepsiburada.com"];

/// Without a same-site referer the storefront answers 403.
pub const EXTRA_HEADERS: &[(&str, &str)] = &[
    ("referer", "https://www.hepsiburada.com/"),
    ("cache-control", "max-age=0"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "same-origin"),
];
