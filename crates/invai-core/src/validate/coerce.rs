//! Permissive conversions from untyped JSON values.
//!
//! Semantics follow the loose truthiness and number reading of a typical
//! dynamic-language consumer: `null`, `false`, `""` and `0` are falsy,
//! numeric strings read as numbers, anything unreadable reads as zero.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::Value;

/// Date layouts accepted for date fields, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Whether a raw value counts as present.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// String field: falsy values become empty, other scalars their text form.
pub fn to_string_field(value: Option<&Value>) -> String {
    if !is_truthy(value) {
        return String::new();
    }
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Optional string field: absent, `null` and blank strings become `None`.
pub fn to_optional_string(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Outcome of reading a numeric field.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberRead {
    /// A number was read.
    Value(Decimal),
    /// Nothing to read: absent, `null` or an empty string.
    Absent,
    /// Something was there but it is not a number.
    Invalid(String),
}

impl NumberRead {
    /// Lenient reading: anything but a number is zero.
    pub fn or_zero(&self) -> Decimal {
        match self {
            NumberRead::Value(d) => *d,
            NumberRead::Absent | NumberRead::Invalid(_) => Decimal::ZERO,
        }
    }
}

/// Read a numeric field.
pub fn read_number(value: Option<&Value>) -> NumberRead {
    match value {
        None | Some(Value::Null) => NumberRead::Absent,
        Some(Value::Bool(b)) => NumberRead::Value(if *b { Decimal::ONE } else { Decimal::ZERO }),
        Some(Value::Number(n)) => parse_decimal(&n.to_string())
            .map(NumberRead::Value)
            .unwrap_or_else(|| NumberRead::Invalid(n.to_string())),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                NumberRead::Absent
            } else {
                parse_decimal(trimmed)
                    .map(NumberRead::Value)
                    .unwrap_or_else(|| NumberRead::Invalid(s.clone()))
            }
        }
        Some(other) => NumberRead::Invalid(other.to_string()),
    }
}

/// Parse plain or scientific decimal text. Magnitudes beyond what `Decimal`
/// holds saturate at `Decimal::MAX` or `Decimal::MIN`.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.strip_prefix('+').unwrap_or(text);
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
        .or_else(|| saturate(text))
        .map(|d| d.normalize())
}

fn saturate(text: &str) -> Option<Decimal> {
    let numeric = !text.is_empty()
        && text.bytes().all(|b| b.is_ascii_digit() || b"-.eE".contains(&b));
    if !numeric {
        return None;
    }

    let value: f64 = text.parse().ok()?;
    if value.is_nan() {
        return None;
    }
    if let Some(decimal) = Decimal::from_f64(value) {
        return Some(decimal);
    }

    Some(if value.abs() < 1.0 {
        Decimal::ZERO
    } else if value.is_sign_positive() {
        Decimal::MAX
    } else {
        Decimal::MIN
    })
}

/// Convert a number to a quantity: truncated toward zero, negatives become
/// zero, values beyond `u32::MAX` saturate.
pub fn to_quantity(number: Decimal) -> u32 {
    if number.is_sign_negative() {
        return 0;
    }
    number.trunc().to_u32().unwrap_or(u32::MAX)
}

/// Read a calendar date from a string value.
pub fn read_date(value: Option<&Value>) -> Option<NaiveDate> {
    let text = value?.as_str()?.trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(0.0))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(is_truthy(Some(&json!("0"))));
        assert!(is_truthy(Some(&json!(-1))));
        assert!(is_truthy(Some(&json!([]))));
    }

    #[test]
    fn string_fields() {
        assert_eq!(to_string_field(Some(&json!("ACME"))), "ACME");
        assert_eq!(to_string_field(Some(&json!(1042))), "1042");
        assert_eq!(to_string_field(Some(&json!(null))), "");
        assert_eq!(to_string_field(Some(&json!(0))), "");
        assert_eq!(to_optional_string(Some(&json!("  "))), None);
        assert_eq!(to_optional_string(Some(&json!("a@b.c"))), Some("a@b.c".to_string()));
    }

    #[test]
    fn numbers() {
        assert_eq!(read_number(Some(&json!(12.5))), NumberRead::Value(Decimal::new(125, 1)));
        assert_eq!(read_number(Some(&json!(" 7 "))), NumberRead::Value(Decimal::from(7)));
        assert_eq!(read_number(Some(&json!("1e3"))), NumberRead::Value(Decimal::from(1000)));
        assert_eq!(read_number(Some(&json!(true))), NumberRead::Value(Decimal::ONE));
        assert_eq!(read_number(Some(&json!(""))), NumberRead::Absent);
        assert_eq!(read_number(None), NumberRead::Absent);
        assert_eq!(
            read_number(Some(&json!("twelve"))),
            NumberRead::Invalid("twelve".to_string())
        );
        assert_eq!(read_number(Some(&json!({"v": 1}))).or_zero(), Decimal::ZERO);
    }

    #[test]
    fn out_of_range_numbers_saturate() {
        assert_eq!(read_number(Some(&json!(1e300))), NumberRead::Value(Decimal::MAX));
        assert_eq!(read_number(Some(&json!(-1e300))), NumberRead::Value(Decimal::MIN));
        assert_eq!(read_number(Some(&json!(1.23e29))), NumberRead::Value(Decimal::MAX));
        assert_eq!(read_number(Some(&json!("9e99"))), NumberRead::Value(Decimal::MAX));
        assert_eq!(read_number(Some(&json!("1e-300"))).or_zero(), Decimal::ZERO);
        assert_eq!(
            read_number(Some(&json!("1e3x"))),
            NumberRead::Invalid("1e3x".to_string())
        );
    }

    #[test]
    fn quantities() {
        assert_eq!(to_quantity(Decimal::new(39, 1)), 3);
        assert_eq!(to_quantity(Decimal::from(-4)), 0);
        assert_eq!(to_quantity(Decimal::from(u64::MAX)), u32::MAX);
    }

    #[test]
    fn dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(read_date(Some(&json!("2024-01-15"))), expected);
        assert_eq!(read_date(Some(&json!("2024/01/15"))), expected);
        assert_eq!(read_date(Some(&json!("15.01.2024"))), expected);
        assert_eq!(read_date(Some(&json!("15/01/2024"))), expected);
        assert_eq!(read_date(Some(&json!("2024-01-15T10:30:00Z"))), expected);
        assert_eq!(read_date(Some(&json!("next tuesday"))), None);
        assert_eq!(read_date(Some(&json!(20240115))), None);
    }
}
