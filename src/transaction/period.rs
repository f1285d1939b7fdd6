//! Calendar-month periods and the weekly breakdown shown on the transactions chart.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};

use crate::{
    Error,
    transaction::core::{Transaction, TransactionType},
};

/// The number of week slots a month is divided into.
pub const WEEKS_PER_MONTH: usize = 5;

/// The query string accepted by the endpoints that work on a single month.
///
/// The values are kept as text and parsed leniently so that junk such as
/// `month=abc` falls back to the default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    /// The month, 1 to 12. Defaults to the current month.
    pub month: Option<String>,
    /// The year. Defaults to the current year.
    pub year: Option<String>,
    /// Optional transaction type filter.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl PeriodQuery {
    /// Resolve the month and year, using `today` for missing values.
    ///
    /// # Errors
    /// See [Period::resolve].
    pub fn period(&self, today: Date) -> Result<Period, Error> {
        Period::resolve(
            self.month.as_deref().and_then(parse_integer_prefix),
            self.year.as_deref().and_then(parse_integer_prefix),
            today,
        )
    }

    /// The type filter, if it names a valid transaction type.
    ///
    /// Anything else is ignored rather than rejected.
    pub fn type_filter(&self) -> Option<TransactionType> {
        self.kind.as_deref().and_then(|kind| kind.parse().ok())
    }
}

/// A calendar month in a specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    /// The month.
    pub month: Month,
    /// The year.
    pub year: i32,
}

impl Period {
    /// Build a period from an optional month and year.
    ///
    /// A missing or zero month or year is replaced by the one from `today`.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::InvalidMonth] if the month is not between 1 and 12,
    /// - or [Error::InvalidYear] if the year cannot be represented as a date.
    pub fn resolve(month: Option<i64>, year: Option<i64>, today: Date) -> Result<Self, Error> {
        let month = match month {
            Some(month) if month != 0 => month,
            _ => u8::from(today.month()) as i64,
        };
        let year = match year {
            Some(year) if year != 0 => year,
            _ => today.year() as i64,
        };

        let month = u8::try_from(month)
            .ok()
            .and_then(|month| Month::try_from(month).ok())
            .ok_or(Error::InvalidMonth(month))?;
        let year = i32::try_from(year)
            .ok()
            .filter(|year| Date::from_calendar_date(*year, month, 1).is_ok())
            .ok_or(Error::InvalidYear(year))?;

        Ok(Self { month, year })
    }

    /// The month as a number from 1 to 12.
    pub fn month_number(&self) -> u8 {
        u8::from(self.month)
    }

    /// The instants bounding this period.
    ///
    /// The range starts at midnight UTC on the first day of the month and
    /// ends at midnight UTC on the first day of the following month. Both
    /// ends are inclusive.
    ///
    /// # Errors
    /// Returns [Error::InvalidYear] if the following month cannot be
    /// represented as a date, i.e. December of the maximum year.
    pub fn date_range(&self) -> Result<RangeInclusive<OffsetDateTime>, Error> {
        let start = Date::from_calendar_date(self.year, self.month, 1)
            .map_err(|_| Error::InvalidYear(self.year as i64))?;

        let next_year = if self.month == Month::December {
            self.year + 1
        } else {
            self.year
        };
        let end = Date::from_calendar_date(next_year, self.month.next(), 1)
            .map_err(|_| Error::InvalidYear(next_year as i64))?;

        Ok(start.midnight().assume_utc()..=end.midnight().assume_utc())
    }
}

/// Parse the leading integer in `text`, ignoring anything after it.
///
/// Leading whitespace and a sign are allowed, e.g. " 12th" gives 12.
pub fn parse_integer_prefix(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let digits_start = usize::from(trimmed.starts_with(['+', '-']));
    let digits_end = trimmed[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed.len(), |offset| digits_start + offset);

    trimmed[..digits_end].parse().ok()
}

/// Income and expense totals for one week of a month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekBucket {
    /// The week number, 1 to [WEEKS_PER_MONTH].
    pub week: u8,
    /// A display label, e.g. "Week 1".
    pub week_label: String,
    /// Total income in this week.
    pub income: f64,
    /// Total expenses in this week.
    pub expense: f64,
    /// Income minus expenses.
    pub net: f64,
}

/// The week slot for a day of the month.
///
/// Weeks are fixed seven-day blocks counted from the first of the month, not
/// calendar weeks: days 1-7 are week 1, days 8-14 are week 2 and days 29-31
/// are week 5.
pub fn week_of_month(day: u8) -> u8 {
    day.div_ceil(7)
}

/// Sum income and expenses into [WEEKS_PER_MONTH] week slots.
///
/// The result always has one entry per week, in week order.
pub fn bucket_by_week(transactions: &[Transaction]) -> Vec<WeekBucket> {
    let mut totals = [(0.0, 0.0); WEEKS_PER_MONTH];

    for transaction in transactions {
        let week = week_of_month(transaction.date.day()) as usize;

        let Some((income, expense)) = totals.get_mut(week.wrapping_sub(1)) else {
            continue;
        };

        match transaction.kind {
            TransactionType::Income => *income += transaction.amount,
            TransactionType::Expense => *expense += transaction.amount,
        }
    }

    totals
        .iter()
        .enumerate()
        .map(|(index, (income, expense))| {
            let week = index as u8 + 1;

            WeekBucket {
                week,
                week_label: format!("Week {week}"),
                income: *income,
                expense: *expense,
                net: income - expense,
            }
        })
        .collect()
}

#[cfg(test)]
mod period_tests {
    use time::{Month, macros::date, macros::datetime};

    use crate::{
        Error,
        transaction::period::{Period, PeriodQuery, parse_integer_prefix},
    };

    #[test]
    fn missing_values_default_to_today() {
        let got = Period::resolve(None, None, date!(2025 - 06 - 17)).unwrap();

        assert_eq!(
            got,
            Period {
                month: Month::June,
                year: 2025
            }
        );
    }

    #[test]
    fn zero_is_treated_as_missing() {
        let got = Period::resolve(Some(0), Some(0), date!(2025 - 06 - 17)).unwrap();

        assert_eq!(got.month, Month::June);
        assert_eq!(got.year, 2025);
    }

    #[test]
    fn rejects_months_out_of_range() {
        let today = date!(2025 - 06 - 17);

        assert_eq!(
            Period::resolve(Some(13), None, today),
            Err(Error::InvalidMonth(13))
        );
        assert_eq!(
            Period::resolve(Some(-1), None, today),
            Err(Error::InvalidMonth(-1))
        );
    }

    #[test]
    fn date_range_spans_the_month_inclusive_of_next_first() {
        let period = Period {
            month: Month::February,
            year: 2024,
        };

        let range = period.date_range().unwrap();

        assert_eq!(*range.start(), datetime!(2024-02-01 00:00 UTC));
        assert_eq!(*range.end(), datetime!(2024-03-01 00:00 UTC));
    }

    #[test]
    fn december_rolls_over_to_next_year() {
        let period = Period {
            month: Month::December,
            year: 2024,
        };

        let range = period.date_range().unwrap();

        assert_eq!(*range.end(), datetime!(2025-01-01 00:00 UTC));
    }

    #[test]
    fn query_parses_like_parse_int() {
        assert_eq!(parse_integer_prefix("7"), Some(7));
        assert_eq!(parse_integer_prefix(" 12th"), Some(12));
        assert_eq!(parse_integer_prefix("-3"), Some(-3));
        assert_eq!(parse_integer_prefix("abc"), None);
        assert_eq!(parse_integer_prefix(""), None);
    }

    #[test]
    fn junk_query_values_fall_back_to_defaults() {
        let query = PeriodQuery {
            month: Some("abc".to_owned()),
            year: Some("".to_owned()),
            kind: Some("everything".to_owned()),
        };

        let period = query.period(date!(2025 - 03 - 09)).unwrap();

        assert_eq!(period.month, Month::March);
        assert_eq!(period.year, 2025);
        assert_eq!(query.type_filter(), None);
    }
}

#[cfg(test)]
mod bucket_tests {
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        UserID,
        transaction::{
            core::{Transaction, TransactionType},
            period::{WEEKS_PER_MONTH, bucket_by_week, week_of_month},
        },
    };

    fn transaction(kind: TransactionType, amount: f64, date: OffsetDateTime) -> Transaction {
        Transaction {
            id: 1,
            user: UserID::new(1),
            kind,
            amount,
            emoji: None,
            category: "misc".to_owned(),
            date,
            note: None,
            receipt_url: None,
            created_at: date,
            updated_at: date,
        }
    }

    #[test]
    fn week_depends_only_on_day_of_month() {
        let weeks: Vec<u8> = [1, 7, 8, 14, 15, 21, 22, 28, 29, 31]
            .into_iter()
            .map(week_of_month)
            .collect();

        assert_eq!(weeks, vec![1, 1, 2, 2, 3, 3, 4, 4, 5, 5]);
    }

    #[test]
    fn empty_month_has_five_zero_weeks() {
        let buckets = bucket_by_week(&[]);

        assert_eq!(buckets.len(), WEEKS_PER_MONTH);
        for (index, bucket) in buckets.iter().enumerate() {
            assert_eq!(bucket.week as usize, index + 1);
            assert_eq!(bucket.week_label, format!("Week {}", index + 1));
            assert_eq!(bucket.income, 0.0);
            assert_eq!(bucket.expense, 0.0);
            assert_eq!(bucket.net, 0.0);
        }
    }

    #[test]
    fn sums_income_and_expense_per_week() {
        let transactions = vec![
            transaction(TransactionType::Income, 1000.0, datetime!(2025-01-03 09:00 UTC)),
            transaction(TransactionType::Expense, 40.0, datetime!(2025-01-05 18:00 UTC)),
            transaction(TransactionType::Expense, 60.0, datetime!(2025-01-09 12:00 UTC)),
            transaction(TransactionType::Expense, 25.0, datetime!(2025-01-31 23:00 UTC)),
        ];

        let buckets = bucket_by_week(&transactions);

        assert_eq!(buckets[0].income, 1000.0);
        assert_eq!(buckets[0].expense, 40.0);
        assert_eq!(buckets[0].net, 960.0);
        assert_eq!(buckets[1].expense, 60.0);
        assert_eq!(buckets[1].net, -60.0);
        assert_eq!(buckets[2].net, 0.0);
        assert_eq!(buckets[3].net, 0.0);
        assert_eq!(buckets[4].expense, 25.0);
    }
}
