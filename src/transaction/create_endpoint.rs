//! Defines the endpoint for creating a new transaction.

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    datetime::parse_date_time,
    transaction::{
        core::{
            AmountInput, Transaction, TransactionBuilder, TransactionType, create_transaction,
            validate_amount, validate_note,
        },
        state::TransactionState,
    },
};

/// The JSON body for creating a transaction.
///
/// Every field is optional at the type level so that missing fields are
/// reported with a helpful message instead of a deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// "income" or "expense".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// The value of the transaction, must be positive. Numeric strings are
    /// accepted too.
    pub amount: Option<AmountInput>,
    /// Optional display emoji.
    pub emoji: Option<String>,
    /// The category label.
    pub category: Option<String>,
    /// When the transaction happened, defaults to now.
    pub date: Option<String>,
    /// Optional note.
    pub note: Option<String>,
    /// Optional link to a receipt image.
    pub receipt_url: Option<String>,
}

impl CreateTransactionRequest {
    /// Validate the request and turn it into a builder for a transaction
    /// owned by `user`.
    ///
    /// `now` is used when the request has no date.
    ///
    /// # Errors
    /// Returns the first validation error found, checked in this order:
    /// missing fields, type, amount, note length, date.
    pub fn into_builder(
        self,
        user: UserID,
        now: OffsetDateTime,
    ) -> Result<TransactionBuilder, Error> {
        let kind = self.kind.filter(|kind| !kind.is_empty());
        let amount = self
            .amount
            .as_ref()
            .and_then(AmountInput::value)
            .filter(|amount| *amount != 0.0);
        let category = self.category.filter(|category| !category.is_empty());

        let (Some(kind), Some(amount), Some(category)) = (kind, amount, category) else {
            return Err(Error::MissingRequiredFields);
        };

        let kind: TransactionType = kind.parse()?;
        let amount = validate_amount(amount)?;

        if let Some(note) = &self.note {
            validate_note(note)?;
        }

        let date = match self.date.as_deref().filter(|date| !date.is_empty()) {
            Some(date) => parse_date_time(date)?,
            None => now,
        };

        Ok(Transaction::build(user, kind, amount, &category, date)
            .emoji(self.emoji)
            .note(self.note)
            .receipt_url(self.receipt_url))
    }
}

/// The JSON body returned after creating or updating a transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// The stored transaction.
    pub transaction: Transaction,
}

/// A route handler for creating a new transaction owned by the caller.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<Json<TransactionResponse>, Error> {
    let builder = request.into_builder(user_id, OffsetDateTime::now_utc())?;

    let connection = state.connection()?;
    let transaction = create_transaction(builder, &connection)
        .inspect_err(|error| tracing::error!("could not create transaction: {error}"))?;

    tracing::info!(
        "User {user_id} created transaction {} ({} {})",
        transaction.id,
        transaction.kind,
        transaction.amount
    );

    Ok(Json(TransactionResponse { transaction }))
}
