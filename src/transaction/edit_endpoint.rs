use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Deserializer};

use crate::{
    Error, UserID,
    database_id::TransactionId,
    datetime::parse_date_time,
    transaction::{
        core::{
            AmountInput, TransactionType, TransactionUpdate, update_transaction,
            validate_amount, validate_note,
        },
        create_endpoint::TransactionResponse,
        state::TransactionState,
    },
};

/// The JSON body for editing a transaction.
///
/// Missing fields are left unchanged. A `null` clears `emoji`, `note` and
/// `receiptUrl` and leaves the required fields unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTransactionRequest {
    #[serde(rename = "type")]
    kind: Option<String>,
    amount: Option<AmountInput>,
    #[serde(default, deserialize_with = "deserialize_present")]
    emoji: Option<Option<String>>,
    category: Option<String>,
    date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    note: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    receipt_url: Option<Option<String>>,
}

/// Wrap any field that is present, including an explicit `null`, in `Some`.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl EditTransactionRequest {
    fn into_update(self) -> Result<TransactionUpdate, Error> {
        let kind = self
            .kind
            .map(|kind| kind.parse::<TransactionType>())
            .transpose()?;
        let amount = self
            .amount
            .map(|amount| {
                amount
                    .value()
                    .ok_or(Error::NonPositiveAmount(f64::NAN))
                    .and_then(validate_amount)
            })
            .transpose()?;

        if let Some(Some(note)) = &self.note {
            validate_note(note)?;
        }

        if self.category.as_deref() == Some("") {
            return Err(Error::EmptyCategory);
        }

        let date = self.date.as_deref().map(parse_date_time).transpose()?;

        Ok(TransactionUpdate {
            kind,
            amount,
            emoji: self.emoji,
            category: self.category,
            date,
            note: self.note,
            receipt_url: self.receipt_url,
        })
    }
}

/// A route handler for updating a transaction owned by the caller.
///
/// Responds with 404 if the transaction does not exist or belongs to
/// someone else.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Json(request): Json<EditTransactionRequest>,
) -> Result<Json<TransactionResponse>, Error> {
    let update = request.into_update()?;

    let connection = state.connection()?;
    let transaction = update_transaction(transaction_id, user_id, update, &connection)
        .inspect_err(|error| {
            if *error != Error::NotFound {
                tracing::error!("Could not update transaction {transaction_id}: {error}");
            }
        })?;

    Ok(Json(TransactionResponse { transaction }))
}
