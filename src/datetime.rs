//! Parsing and formatting of the date-times stored on transactions.
//!
//! Clients may send either a full RFC 3339 date-time ("2025-01-15T09:30:00Z")
//! or a plain calendar date ("2025-01-15"). Everything is normalised to UTC
//! before it is stored so that date comparisons in SQL hold.

use time::{
    Date, OffsetDateTime, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

use crate::Error;

/// Calendar date format, e.g. "2025-01-15".
const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse `text` as an RFC 3339 date-time or a `YYYY-MM-DD` date.
///
/// Plain dates are interpreted as midnight UTC.
///
/// # Errors
/// Returns [Error::InvalidDate] if `text` matches neither format.
pub fn parse_date_time(text: &str) -> Result<OffsetDateTime, Error> {
    let trimmed = text.trim();

    if let Ok(date_time) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(date_time.to_offset(UtcOffset::UTC));
    }

    Date::parse(trimmed, DATE_FORMAT)
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| Error::InvalidDate(text.to_owned()))
}

/// Format the calendar date part of `date_time` in UTC, e.g. "2025-01-15".
pub fn format_date(date_time: OffsetDateTime) -> String {
    let date = date_time.to_offset(UtcOffset::UTC).date();

    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Serialize an [OffsetDateTime] as an RFC 3339 string in UTC.
pub fn serialize<S>(date_time: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let formatted = date_time
        .to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;

    serializer.serialize_str(&formatted)
}

/// Serialize an optional [OffsetDateTime] as an RFC 3339 string or `null`.
pub fn serialize_option<S>(
    date_time: &Option<OffsetDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match date_time {
        Some(date_time) => serialize(date_time, serializer),
        None => serializer.serialize_none(),
    }
}
