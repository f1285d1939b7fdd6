use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    transaction::{
        core::{Transaction, get_transactions_in_range},
        period::{PeriodQuery, WeekBucket, bucket_by_week},
        state::TransactionState,
    },
};

/// A month of transactions together with the weekly chart data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    data: Vec<Transaction>,
    chart_data: Vec<WeekBucket>,
    month: u8,
    year: i32,
    total_items: usize,
}

/// A route handler that lists the caller's transactions for one month.
///
/// The query string may set `month`, `year` and `type`. The weekly chart is
/// built from the same (possibly filtered) transactions.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<TransactionsResponse>, Error> {
    let period = query.period(OffsetDateTime::now_utc().date())?;
    let date_range = period.date_range()?;

    let transactions = {
        let connection = state.connection()?;
        get_transactions_in_range(user_id, date_range, query.type_filter(), &connection)
            .inspect_err(|error| {
                tracing::error!("Could not get transactions for user {user_id}: {error}")
            })?
    };

    let chart_data = bucket_by_week(&transactions);

    Ok(Json(TransactionsResponse {
        total_items: transactions.len(),
        data: transactions,
        chart_data,
        month: period.month_number(),
        year: period.year,
    }))
}
