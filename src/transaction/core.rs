//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, ops::RangeInclusive, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, UserID, database_id::TransactionId, datetime};

/// The smallest amount of money a transaction can record.
pub const MIN_AMOUNT: f64 = 0.01;

/// The maximum number of characters in a transaction's note.
pub const MAX_NOTE_LENGTH: usize = 500;

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money that was earned.
    Income,
    /// Money that was spent.
    Expense,
}

impl TransactionType {
    /// The name used for the type in JSON, SQL and spreadsheets.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(Error::InvalidTransactionType(other.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income recorded by a user.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user: UserID,
    /// Whether the transaction was income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The amount of money earned or spent, always positive.
    pub amount: f64,
    /// An emoji the client displays next to the transaction.
    pub emoji: Option<String>,
    /// A free-text category label, e.g. "groceries".
    pub category: String,
    /// When the transaction happened.
    #[serde(serialize_with = "datetime::serialize")]
    pub date: OffsetDateTime,
    /// An optional note of at most [MAX_NOTE_LENGTH] characters.
    pub note: Option<String>,
    /// A link to a photo of the receipt.
    pub receipt_url: Option<String>,
    /// When the transaction was recorded.
    #[serde(serialize_with = "datetime::serialize")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(serialize_with = "datetime::serialize")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        user: UserID,
        kind: TransactionType,
        amount: f64,
        category: &str,
        date: OffsetDateTime,
    ) -> TransactionBuilder {
        TransactionBuilder {
            user,
            kind,
            amount,
            category: category.to_owned(),
            date,
            emoji: None,
            note: None,
            receipt_url: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The required fields are set by [Transaction::build], the optional ones
/// with the builder methods.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The user that will own the transaction.
    pub user: UserID,
    /// Income or expense.
    pub kind: TransactionType,
    /// Must be at least [MIN_AMOUNT].
    pub amount: f64,
    /// The category label.
    pub category: String,
    /// When the transaction happened.
    pub date: OffsetDateTime,
    /// Optional display emoji.
    pub emoji: Option<String>,
    /// Optional note, at most [MAX_NOTE_LENGTH] characters.
    pub note: Option<String>,
    /// Optional link to a receipt image.
    pub receipt_url: Option<String>,
}

impl TransactionBuilder {
    /// Set the emoji for the transaction.
    pub fn emoji(mut self, emoji: Option<String>) -> Self {
        self.emoji = emoji;
        self
    }

    /// Set the note for the transaction.
    pub fn note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    /// Set the receipt URL for the transaction.
    pub fn receipt_url(mut self, receipt_url: Option<String>) -> Self {
        self.receipt_url = receipt_url;
        self
    }
}

/// The fields of a transaction that an update may change.
///
/// `None` leaves the stored value as it is. The optional fields use
/// `Some(None)` to clear the stored value.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionUpdate {
    /// New type.
    pub kind: Option<TransactionType>,
    /// New amount.
    pub amount: Option<f64>,
    /// New emoji, or `Some(None)` to remove it.
    pub emoji: Option<Option<String>>,
    /// New category.
    pub category: Option<String>,
    /// New date.
    pub date: Option<OffsetDateTime>,
    /// New note, or `Some(None)` to remove it.
    pub note: Option<Option<String>>,
    /// New receipt URL, or `Some(None)` to remove it.
    pub receipt_url: Option<Option<String>>,
}

// ============================================================================
// VALIDATION
// ============================================================================

/// An amount as sent by a client: either a JSON number or a string holding
/// one, e.g. `12.5` or `"12.5"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    /// A JSON number.
    Number(f64),
    /// A JSON string that should contain a number.
    Text(String),
}

impl AmountInput {
    /// The amount as a number, or `None` if the text is not a finite number.
    pub fn value(&self) -> Option<f64> {
        match self {
            AmountInput::Number(amount) => Some(*amount),
            AmountInput::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|amount| amount.is_finite()),
        }
    }
}

/// Check that `amount` is at least [MIN_AMOUNT].
///
/// # Errors
/// Returns [Error::NonPositiveAmount] otherwise.
pub fn validate_amount(amount: f64) -> Result<f64, Error> {
    if amount >= MIN_AMOUNT {
        Ok(amount)
    } else {
        Err(Error::NonPositiveAmount(amount))
    }
}

/// Check that `note` is no longer than [MAX_NOTE_LENGTH] characters.
///
/// # Errors
/// Returns [Error::NoteTooLong] otherwise.
pub fn validate_note(note: &str) -> Result<(), Error> {
    let length = note.chars().count();

    if length > MAX_NOTE_LENGTH {
        Err(Error::NoteTooLong(length))
    } else {
        Ok(())
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str =
    "id, user_id, type, amount, emoji, category, date, note, receipt_url, created_at, updated_at";

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, type, amount, emoji, category, date, note, receipt_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                builder.user,
                builder.kind,
                builder.amount,
                builder.emoji,
                builder.category,
                builder.date,
                builder.note,
                builder.receipt_url,
                now,
            ],
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Retrieve the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
#[cfg(test)]
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row(params![id, user_id], map_transaction_row)
        .map_err(Error::from)
}

/// Get all of a user's transactions, most recent first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_user_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1
             ORDER BY date DESC, id DESC"
        ))?
        .query_map(params![user_id], map_transaction_row)?
        .collect::<Result<Vec<_>, rusqlite::Error>>()
        .map_err(Error::from)
}

/// Get a user's transactions with dates in `date_range` (both ends
/// inclusive), most recent first.
///
/// When `kind` is given only transactions of that type are returned.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions_in_range(
    user_id: UserID,
    date_range: RangeInclusive<OffsetDateTime>,
    kind: Option<TransactionType>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1
                AND date BETWEEN ?2 AND ?3
                AND (?4 IS NULL OR type = ?4)
             ORDER BY date DESC, id DESC"
        ))?
        .query_map(
            params![user_id, date_range.start(), date_range.end(), kind],
            map_transaction_row,
        )?
        .collect::<Result<Vec<_>, rusqlite::Error>>()
        .map_err(Error::from)
}

/// Apply `update` to the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    // The optional columns are only written when their flag is set, which
    // lets an update store NULL.
    let set_emoji = update.emoji.is_some();
    let set_note = update.note.is_some();
    let set_receipt_url = update.receipt_url.is_some();

    connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET
                type = COALESCE(?1, type),
                amount = COALESCE(?2, amount),
                emoji = CASE WHEN ?3 THEN ?4 ELSE emoji END,
                category = COALESCE(?5, category),
                date = COALESCE(?6, date),
                note = CASE WHEN ?7 THEN ?8 ELSE note END,
                receipt_url = CASE WHEN ?9 THEN ?10 ELSE receipt_url END,
                updated_at = ?11
             WHERE id = ?12 AND user_id = ?13
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                update.kind,
                update.amount,
                set_emoji,
                update.emoji.flatten(),
                update.category,
                update.date,
                set_note,
                update.note.flatten(),
                set_receipt_url,
                update.receipt_url.flatten(),
                OffsetDateTime::now_utc(),
                id,
                user_id,
            ],
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// The number of rows changed by a query.
pub type RowsAffected = usize;

/// Delete the transaction `id` if it is owned by `user_id`.
///
/// Returns zero when there was nothing to delete.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )
        .map_err(Error::from)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                amount REAL NOT NULL CHECK (amount >= 0.01),
                emoji TEXT,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                note TEXT CHECK (note IS NULL OR length(note) <= 500),
                receipt_url TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    // Every query filters by user and most order or filter by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user: row.get(1)?,
        kind: row.get(2)?,
        amount: row.get(3)?,
        emoji: row.get(4)?,
        category: row.get(5)?,
        date: row.get(6)?,
        note: row.get(7)?,
        receipt_url: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod validation_tests {
    use crate::{
        Error,
        transaction::core::{
            AmountInput, MAX_NOTE_LENGTH, TransactionType, validate_amount, validate_note,
        },
    };

    #[test]
    fn parses_transaction_types() {
        assert_eq!(
            "income".parse::<TransactionType>(),
            Ok(TransactionType::Income)
        );
        assert_eq!(
            "expense".parse::<TransactionType>(),
            Ok(TransactionType::Expense)
        );
        assert_eq!(
            "Income".parse::<TransactionType>(),
            Err(Error::InvalidTransactionType("Income".to_owned()))
        );
    }

    #[test]
    fn rejects_zero_and_negative_amounts() {
        assert_eq!(validate_amount(0.0), Err(Error::NonPositiveAmount(0.0)));
        assert_eq!(validate_amount(-5.0), Err(Error::NonPositiveAmount(-5.0)));
        assert_eq!(validate_amount(0.01), Ok(0.01));
    }

    #[test]
    fn amounts_may_be_numbers_or_numeric_strings() {
        let cases = [
            (serde_json::json!(12.5), Some(12.5)),
            (serde_json::json!("12.5"), Some(12.5)),
            (serde_json::json!(" 7 "), Some(7.0)),
            (serde_json::json!("twelve"), None),
            (serde_json::json!("NaN"), None),
            (serde_json::json!("inf"), None),
        ];

        for (json, want) in cases {
            let amount: AmountInput = serde_json::from_value(json.clone()).unwrap();
            assert_eq!(amount.value(), want, "got wrong value for {json}");
        }
    }

    #[test]
    fn note_length_counts_characters_not_bytes() {
        let emoji_note = "🍕".repeat(MAX_NOTE_LENGTH);

        assert_eq!(validate_note(&emoji_note), Ok(()));
        assert_eq!(
            validate_note(&"a".repeat(MAX_NOTE_LENGTH + 1)),
            Err(Error::NoteTooLong(MAX_NOTE_LENGTH + 1))
        );
    }
}
