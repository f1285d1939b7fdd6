//! Dashboard HTTP handler.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    dashboard::aggregation::{DashboardReport, summarize},
    db::lock_connection,
    transaction::get_user_transactions,
};

/// The state needed for the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns the caller's [DashboardReport].
pub async fn get_dashboard_endpoint(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<DashboardReport>, Error> {
    let transactions = {
        let connection = lock_connection(&state.db_connection)?;

        get_user_transactions(user_id, &connection).inspect_err(|error| {
            tracing::error!("Could not get transactions for user {user_id}: {error}")
        })?
    };

    Ok(Json(summarize(transactions)))
}
