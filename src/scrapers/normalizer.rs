//! Turns locale-ambiguous price text ("₺36.499,00", "1,299.99 TL") into an exact decimal.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

lazy_static! {
    // A space, NBSP or narrow NBSP used as a thousands separator: "2 499,50"
    static ref SPACE_GROUP_REGEX: Regex = Regex::new(r"(\d)[ \x{00A0}\x{202F}](\d{3}(?:\D|$))").unwrap();
    static ref NUMBER_REGEX: Regex = Regex::new(r"\d[\d.,]*").unwrap();
    static ref GROUPED_SHAPE: Regex = Regex::new(r"^\d{1,3}(?:[.,]\d{3})+(?:[.,]\d{1,2})?$").unwrap();
    static ref PLAIN_SHAPE: Regex = Regex::new(r"^\d+(?:[.,]\d+)?$").unwrap();
}

/// Markers that may sit right after an amount.
const CURRENCY_SUFFIXES: &[&str] = &["TL", "TRY", "₺", "$", "€", "USD", "EUR"];

/// Markers that may sit right before an amount.
const CURRENCY_PREFIXES: &[&str] = &["₺", "$", "€", "TRY", "TL", "USD", "EUR"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceParseError {
    /// The text contains no digit at all.
    NoDigits(String),
    /// Digits were found but no reading of them is a valid number.
    Unparsable(String),
}

impl std::fmt::Display for PriceParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceParseError::NoDigits(text) => write!(f, "No digits in price text: {:?}", text),
            PriceParseError::Unparsable(text) => write!(f, "Unparsable price text: {:?}", text),
        }
    }
}

impl std::error::Error for PriceParseError {}

/// Parse price text into an exact decimal.
///
/// The amount is the price-shaped number in the text: the first one next to a
/// currency marker, or the only one when there is no marker. Percentages are
/// never amounts. Several unmarked numbers are ambiguous and rejected.
///
/// With both `.` and `,` present the right-most one is the decimal point and the
/// other is a thousands separator. A lone `,` is a decimal comma. A lone `.` is
/// left as is. If the canonical form does not parse, the Turkish convention
/// (`.` thousands, `,` decimal) is tried before giving up.
pub fn normalize_price(text: &str) -> Result<Decimal, PriceParseError> {
    if !text.chars().any(|c| c.is_ascii_digit()) {
        return Err(PriceParseError::NoDigits(text.to_string()));
    }

    let unparsable = || PriceParseError::Unparsable(text.to_string());
    let compact = join_space_groups(text);
    let token = amount_token(&compact).ok_or_else(unparsable)?;

    Decimal::from_str(&canonicalize(token))
        .or_else(|_| Decimal::from_str(&turkish_reading(token)))
        .map_err(|_| unparsable())
}

fn join_space_groups(text: &str) -> String {
    let mut current = text.to_string();
    // Each pass joins every other group of a run like "1 234 567"
    loop {
        let joined = SPACE_GROUP_REGEX.replace_all(&current, "$1$2").into_owned();
        if joined == current {
            return current;
        }
        current = joined;
    }
}

fn amount_token(text: &str) -> Option<&str> {
    let mut candidates = Vec::new();

    for m in NUMBER_REGEX.find_iter(text) {
        let token = m.as_str().trim_end_matches(['.', ',']);
        let before = &text[..m.start()];
        let after = &text[m.start() + token.len()..];

        if before.ends_with('%') || after.trim_start().starts_with('%') {
            continue;
        }
        if !GROUPED_SHAPE.is_match(token) && !PLAIN_SHAPE.is_match(token) {
            continue;
        }
        if has_currency_marker(before, after) {
            return Some(token);
        }
        candidates.push(token);
    }

    match candidates.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

fn has_currency_marker(before: &str, after: &str) -> bool {
    let after = after.trim_start().to_uppercase();
    let before = before.trim_end().to_uppercase();

    CURRENCY_SUFFIXES.iter().any(|marker| after.starts_with(marker))
        || CURRENCY_PREFIXES.iter().any(|marker| before.ends_with(marker))
}

fn canonicalize(token: &str) -> String {
    match (token.rfind('.'), token.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => token.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => token.replace(',', ""),
        (None, Some(_)) => token.replace(',', "."),
        _ => token.to_string(),
    }
}

fn turkish_reading(token: &str) -> String {
    token.replace('.', "").replace(',', ".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_single_and_mixed_separators_agree() {
        assert_eq!(normalize_price("36.499,00").unwrap(), dec!(36499.00));
        assert_eq!(normalize_price("36499,00").unwrap(), dec!(36499.00));
        assert_eq!(normalize_price("36499.00").unwrap(), dec!(36499.00));
        assert_eq!(normalize_price("36,499.00").unwrap(), dec!(36499.00));
    }

    #[test]
    fn test_currency_and_spaces_are_ignored() {
        assert_eq!(normalize_price("₺36.499,00").unwrap(), dec!(36499.00));
        assert_eq!(normalize_price("36.499,00 TL").unwrap(), dec!(36499.00));
        assert_eq!(normalize_price("1\u{00A0}299,90 TL").unwrap(), dec!(1299.90));
        assert_eq!(normalize_price("  TRY 2 499,50 ").unwrap(), dec!(2499.50));
        assert_eq!(normalize_price("$1,299.99").unwrap(), dec!(1299.99));
    }

    #[test]
    fn test_lone_dot_is_kept_as_decimal() {
        assert_eq!(normalize_price("36.499").unwrap(), dec!(36.499));
        assert_eq!(normalize_price("129.9").unwrap(), dec!(129.9));
    }

    #[test]
    fn test_json_ld_values() {
        assert_eq!(normalize_price("1299").unwrap(), dec!(1299));
        assert_eq!(normalize_price("1299.00").unwrap(), dec!(1299));
    }

    #[test]
    fn test_repeated_dots_fall_back_to_turkish_grouping() {
        assert_eq!(normalize_price("1.234.567").unwrap(), dec!(1234567));
    }

    #[test]
    fn test_trailing_separator_is_dropped() {
        assert_eq!(normalize_price("499,").unwrap(), dec!(499));
    }

    #[test]
    fn test_no_digits() {
        assert_eq!(
            normalize_price("Fiyat bilgisi yok"),
            Err(PriceParseError::NoDigits("Fiyat bilgisi yok".to_string()))
        );
        assert!(matches!(normalize_price(""), Err(PriceParseError::NoDigits(_))));
    }

    #[test]
    fn test_amount_next_to_currency_wins() {
        assert_eq!(normalize_price("3 x 433,30 TL").unwrap(), dec!(433.30));
        assert_eq!(normalize_price("Sepette 2. ürün 1.499,00 TL").unwrap(), dec!(1499.00));
        assert_eq!(normalize_price("1.999,99 TL\n 1.499,99 TL").unwrap(), dec!(1999.99));
    }

    #[test]
    fn test_percentages_are_not_amounts() {
        assert_eq!(normalize_price("%20 indirim 1.299,90 TL").unwrap(), dec!(1299.90));
        assert_eq!(normalize_price("Sepette %10 indirimli 1.349,99").unwrap(), dec!(1349.99));
        assert_eq!(normalize_price("1.299,90 (15 % indirim)").unwrap(), dec!(1299.90));
    }

    #[test]
    fn test_space_grouped_millions() {
        assert_eq!(normalize_price("1 234 567,89 TL").unwrap(), dec!(1234567.89));
    }

    #[test]
    fn test_several_unmarked_numbers_are_ambiguous() {
        assert!(matches!(normalize_price("3 x 433,30"), Err(PriceParseError::Unparsable(_))));
        assert!(matches!(normalize_price("%25"), Err(PriceParseError::Unparsable(_))));
    }

    #[test]
    fn test_unparsable() {
        assert!(matches!(
            normalize_price("1.2.3,4,5"),
            Err(PriceParseError::Unparsable(_))
        ));
    }
}
