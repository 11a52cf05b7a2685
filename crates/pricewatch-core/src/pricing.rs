use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

/// Largest amount a `NUMERIC(10, 2)` price column holds.
pub const MAX_PRICE: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 2);

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(?:[.,][0-9]{1,2})?)").expect("valid regex"));

/// Parse a price out of a JSON value.
///
/// Numbers are taken as-is; strings are scanned for the first amount such as
/// `"₾ 3,49"` or `"12.5 GEL"`. Negative, unparseable and out-of-range
/// (above [`MAX_PRICE`]) values yield `None`. The result is rounded to two
/// decimal places.
#[must_use]
pub fn parse_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let parsed = Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .ok()?;
            in_price_range(parsed)
        }
        Value::String(s) => parse_price_str(s),
        _ => None,
    }
}

/// String half of [`parse_price`].
#[must_use]
pub fn parse_price_str(raw: &str) -> Option<Decimal> {
    let m = PRICE_RE.find(raw)?;
    if raw[..m.start()].trim_end().ends_with('-') {
        return None;
    }
    let normalized = m.as_str().replace(',', ".");
    let parsed = Decimal::from_str(&normalized).ok()?;
    in_price_range(parsed)
}

/// `value` rounded to cents, or `None` when negative or above [`MAX_PRICE`].
#[must_use]
pub fn in_price_range(value: Decimal) -> Option<Decimal> {
    let rounded = value.round_dp(2);
    if (rounded.is_sign_negative() && !rounded.is_zero()) || rounded > MAX_PRICE {
        None
    } else {
        Some(rounded)
    }
}

/// Trim and collapse internal whitespace. Blank input yields `None`.
#[must_use]
pub fn normalize_key_text(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parses_json_numbers() {
        assert_eq!(parse_price(&json!(3.5)), Some(d("3.50")));
        assert_eq!(parse_price(&json!(12)), Some(d("12")));
        assert_eq!(parse_price(&json!(2.499)), Some(d("2.50")));
    }

    #[test]
    fn parses_strings_with_currency_and_comma() {
        assert_eq!(parse_price(&json!("₾ 3,49")), Some(d("3.49")));
        assert_eq!(parse_price(&json!("12.5 GEL")), Some(d("12.5")));
        assert_eq!(parse_price(&json!("Price: 7")), Some(d("7")));
    }

    #[test]
    fn takes_first_amount_in_string() {
        assert_eq!(parse_price(&json!("4.99 was 6.99")), Some(d("4.99")));
    }

    #[test]
    fn rejects_negative_and_garbage() {
        assert_eq!(parse_price(&json!(-1.0)), None);
        assert_eq!(parse_price(&json!("-2.50")), None);
        assert_eq!(parse_price(&json!("free")), None);
        assert_eq!(parse_price(&json!(null)), None);
        assert_eq!(parse_price(&json!(true)), None);
        assert_eq!(parse_price(&json!({"amount": 1})), None);
    }

    #[test]
    fn rejects_amounts_past_the_column_limit() {
        assert_eq!(MAX_PRICE, d("99999999.99"));
        assert_eq!(parse_price(&json!(99_999_999.99)), Some(MAX_PRICE));
        assert_eq!(parse_price(&json!(123_456_789)), None);
        assert_eq!(parse_price(&json!("123456789 GEL")), None);
        assert_eq!(in_price_range(d("99999999.995")), None);
        assert_eq!(in_price_range(d("0.001")), Some(d("0.00")));
    }

    #[test]
    fn normalize_key_text_collapses_whitespace() {
        assert_eq!(
            normalize_key_text("  Milk   3.2%\t1L "),
            Some("Milk 3.2% 1L".to_string())
        );
        assert_eq!(normalize_key_text("   "), None);
    }
}
