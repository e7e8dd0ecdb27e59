use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static RE_CURRENCY_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{3}\s*|\s*[A-Za-z]{3}$").unwrap());
static RE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)$").unwrap());

/// Normalize a monetary value to a number.
///
/// Raw JSON numbers pass through. Strings such as `"$1,200.50"`,
/// `"OMR 350"`, `"-€40"` or `"(75.00)"` are cleaned of currency symbols,
/// ISO currency codes and thousands separators. Placeholders like `"TBD"`
/// and anything non-numeric return `None`.
pub fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_amount_str(s),
        _ => None,
    }
}

/// String form of [`parse_amount`].
pub fn parse_amount_str(s: &str) -> Option<f64> {
    let mut s = s.trim();
    let mut negative = false;

    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }

    let without_code = RE_CURRENCY_CODE.replace_all(s, "");
    let cleaned: String = without_code
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',' | ' ' | '\u{a0}'))
        .collect();

    if !RE_NUMBER.is_match(&cleaned) {
        return None;
    }

    let n: f64 = cleaned.parse().ok()?;
    if !n.is_finite() {
        return None;
    }
    Some(if negative { -n.abs() } else { n })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_formatted_and_raw_agree() {
        assert_eq!(parse_amount(&json!("$1,200.50")), Some(1200.5));
        assert_eq!(parse_amount(&json!(1200.50)), Some(1200.5));
    }

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_amount(&json!(0)), Some(0.0));
        assert_eq!(parse_amount(&json!(-45)), Some(-45.0));
        assert_eq!(parse_amount(&json!("350")), Some(350.0));
        assert_eq!(parse_amount(&json!(".5")), Some(0.5));
        assert_eq!(parse_amount(&json!("12.")), Some(12.0));
    }

    #[test]
    fn test_currency_symbols_and_codes() {
        assert_eq!(parse_amount(&json!("€40")), Some(40.0));
        assert_eq!(parse_amount(&json!("£ 1,000")), Some(1000.0));
        assert_eq!(parse_amount(&json!("OMR 350.250")), Some(350.25));
        assert_eq!(parse_amount(&json!("1,500 USD")), Some(1500.0));
    }

    #[test]
    fn test_negative_forms() {
        assert_eq!(parse_amount(&json!("-$50")), Some(-50.0));
        assert_eq!(parse_amount(&json!("$-50")), Some(-50.0));
        assert_eq!(parse_amount(&json!("(75.00)")), Some(-75.0));
        assert_eq!(parse_amount(&json!("($1,000)")), Some(-1000.0));
    }

    #[test]
    fn test_placeholders_are_excluded() {
        assert_eq!(parse_amount(&json!("TBD")), None);
        assert_eq!(parse_amount(&json!("N/A")), None);
        assert_eq!(parse_amount(&json!("")), None);
        assert_eq!(parse_amount(&json!("-")), None);
        assert_eq!(parse_amount(&json!("$")), None);
        assert_eq!(parse_amount(&json!("about 20")), None);
        assert_eq!(parse_amount(&json!("1.2.3")), None);
    }

    #[test]
    fn test_non_scalar_values() {
        assert_eq!(parse_amount(&Value::Null), None);
        assert_eq!(parse_amount(&json!(true)), None);
        assert_eq!(parse_amount(&json!([1, 2])), None);
        assert_eq!(parse_amount(&json!({"amount": 1})), None);
    }
}
