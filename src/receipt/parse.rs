use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{Error, datetime, datetime::parse_date_time};

/// The transaction details read from a receipt.
///
/// Any field the scanner could not fill in is `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScannedReceipt {
    /// The total on the receipt.
    pub amount: Option<f64>,
    /// When the purchase was made.
    #[serde(serialize_with = "datetime::serialize_option")]
    pub date: Option<OffsetDateTime>,
    /// A suggested category.
    pub category: Option<String>,
}

/// Parse the scanner's reply.
///
/// Markdown code fences are removed before parsing the text as a JSON object.
///
/// # Errors
/// Returns:
/// - [Error::NotAReceipt] if the object is empty,
/// - or [Error::InvalidReceiptResponse] if the text is not a JSON object.
pub fn parse_receipt_text(text: &str) -> Result<ScannedReceipt, Error> {
    let cleaned = strip_code_fences(text);

    let object: Map<String, Value> = serde_json::from_str(cleaned.trim())
        .map_err(|error| Error::InvalidReceiptResponse(error.to_string()))?;

    if object.is_empty() {
        return Err(Error::NotAReceipt);
    }

    Ok(ScannedReceipt {
        amount: object.get("amount").and_then(read_amount),
        date: object
            .get("date")
            .and_then(Value::as_str)
            .and_then(|date| parse_date_time(date).ok()),
        category: object
            .get("category")
            .and_then(Value::as_str)
            .map(str::to_owned),
    })
}

/// Remove "```" and "```json" markers along with the newline after them.
fn strip_code_fences(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("```") {
        cleaned.push_str(&rest[..start]);
        rest = &rest[start + 3..];
        rest = rest.strip_prefix("json").unwrap_or(rest);
        rest = rest.strip_prefix('\n').unwrap_or(rest);
    }

    cleaned.push_str(rest);
    cleaned
}

/// Read a number, or the leading number in a string such as "12.50 NZD".
fn read_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_float_prefix(text),
        _ => None,
    }?;

    amount.is_finite().then_some(amount)
}

fn parse_float_prefix(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let mut end = 0;
    let mut seen_point = false;

    for (index, c) in trimmed.char_indices() {
        match c {
            '+' | '-' if index == 0 => {}
            '.' if !seen_point => seen_point = true,
            c if c.is_ascii_digit() => {}
            _ => break,
        }
        end = index + c.len_utf8();
    }

    trimmed[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::{
        Error,
        receipt::parse::{ScannedReceipt, parse_float_prefix, parse_receipt_text, strip_code_fences},
    };

    #[test]
    fn parses_fenced_json() {
        let text = "```json\n{\"amount\": 23.5, \"date\": \"2025-03-14\", \"category\": \"groceries\"}\n```";

        let got = parse_receipt_text(text).unwrap();

        assert_eq!(
            got,
            ScannedReceipt {
                amount: Some(23.5),
                date: Some(datetime!(2025-03-14 00:00 UTC)),
                category: Some("groceries".to_owned()),
            }
        );
    }

    #[test]
    fn empty_object_is_not_a_receipt() {
        assert_eq!(parse_receipt_text("```\n{}\n```"), Err(Error::NotAReceipt));
        assert_eq!(parse_receipt_text("  {}  "), Err(Error::NotAReceipt));
    }

    #[test]
    fn non_json_is_invalid() {
        assert!(matches!(
            parse_receipt_text("I can't read this image"),
            Err(Error::InvalidReceiptResponse(_))
        ));
        assert!(matches!(
            parse_receipt_text("[1, 2]"),
            Err(Error::InvalidReceiptResponse(_))
        ));
    }

    #[test]
    fn amount_may_be_a_string() {
        let got = parse_receipt_text(r#"{"amount": "12.50 NZD"}"#).unwrap();

        assert_eq!(got.amount, Some(12.5));
        assert_eq!(got.date, None);
        assert_eq!(got.category, None);
    }

    #[test]
    fn unreadable_fields_are_null() {
        let got =
            parse_receipt_text(r#"{"amount": "n/a", "date": "yesterday", "category": 3}"#).unwrap();

        assert_eq!(
            got,
            ScannedReceipt {
                amount: None,
                date: None,
                category: None,
            }
        );
    }

    #[test]
    fn rfc3339_dates_are_converted_to_utc() {
        let got = parse_receipt_text(r#"{"date": "2025-03-14T10:00:00+13:00"}"#).unwrap();

        assert_eq!(got.date, Some(datetime!(2025-03-13 21:00 UTC)));
    }

    #[test]
    fn strips_every_fence() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}\n");
        assert_eq!(strip_code_fences("{}"), "{}");
    }

    #[test]
    fn float_prefix() {
        assert_eq!(parse_float_prefix("42"), Some(42.0));
        assert_eq!(parse_float_prefix(" -3.25abc"), Some(-3.25));
        assert_eq!(parse_float_prefix("7."), Some(7.0));
        assert_eq!(parse_float_prefix("abc"), None);
    }
}
