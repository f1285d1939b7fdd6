use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::{
    Error, UserID,
    database_id::TransactionId,
    transaction::{core::delete_transaction, state::TransactionState},
};

/// The JSON body returned after deleting a transaction.
#[derive(Debug, Serialize)]
pub struct DeleteTransactionResponse {
    message: &'static str,
}

/// A route handler for deleting a transaction owned by the caller.
///
/// Responds with 404 if the transaction does not exist or belongs to
/// someone else.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<DeleteTransactionResponse>, Error> {
    let connection = state.connection()?;

    match delete_transaction(transaction_id, user_id, &connection) {
        Ok(0) => Err(Error::NotFound),
        Ok(_) => Ok(Json(DeleteTransactionResponse {
            message: "Transaction deleted successfully!",
        })),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error, UserID, initialize_db,
        transaction::{
            Transaction, TransactionType, create_transaction,
            delete_endpoint::delete_transaction_endpoint, get_transaction,
            state::TransactionState,
        },
    };

    fn get_test_state() -> TransactionState {
        let connection = Connection::open_in_memory().unwrap();
        initialize_db(&connection).unwrap();
        create_transaction(
            Transaction::build(
                UserID::new(1),
                TransactionType::Income,
                1.23,
                "salary",
                datetime!(2025-10-26 00:00 UTC),
            ),
            &connection,
        )
        .unwrap();

        TransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn deletes_transaction() {
        let state = get_test_state();

        let response =
            delete_transaction_endpoint(State(state.clone()), Extension(UserID::new(1)), Path(1))
                .await
                .expect("could not delete transaction");

        assert_eq!(response.0.message, "Transaction deleted successfully!");
        assert_eq!(
            get_transaction(1, UserID::new(1), &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn cannot_delete_another_users_transaction() {
        let state = get_test_state();

        let result =
            delete_transaction_endpoint(State(state.clone()), Extension(UserID::new(2)), Path(1))
                .await;

        assert!(matches!(result, Err(Error::NotFound)));
        assert!(
            get_transaction(1, UserID::new(1), &state.db_connection.lock().unwrap()).is_ok()
        );
    }
}
