//! Exports a month of transactions as an Excel workbook.

use axum::{
    Extension,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use rust_xlsxwriter::{Workbook, XlsxError};
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    datetime::format_date,
    transaction::{
        core::{Transaction, TransactionType, get_transactions_in_range},
        period::PeriodQuery,
        state::TransactionState,
    },
};

/// The MIME type for `.xlsx` files.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const SHEET_NAME: &str = "Transactions";

/// Which transactions go into the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportFilter {
    /// Every transaction, with a type column.
    All,
    /// Only transactions whose type is exactly this text.
    Type(String),
}

impl ExportFilter {
    fn from_query(kind: Option<&str>) -> Self {
        match kind {
            None | Some("") | Some("all") => Self::All,
            Some(kind) => Self::Type(kind.to_owned()),
        }
    }

    fn label(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Type(kind) => kind,
        }
    }
}

/// One spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    /// Only set when exporting every type.
    pub kind: Option<TransactionType>,
    /// The category label.
    pub category: String,
    /// The transaction amount.
    pub amount: f64,
    /// The date as YYYY-MM-DD.
    pub date: String,
}

/// Select and shape the rows for `filter`.
pub fn export_rows(transactions: &[Transaction], filter: &ExportFilter) -> Vec<ExportRow> {
    transactions
        .iter()
        .filter(|transaction| match filter {
            ExportFilter::All => true,
            ExportFilter::Type(kind) => transaction.kind.as_str() == kind,
        })
        .map(|transaction| ExportRow {
            kind: match filter {
                ExportFilter::All => Some(transaction.kind),
                ExportFilter::Type(_) => None,
            },
            category: transaction.category.clone(),
            amount: transaction.amount,
            date: format_date(transaction.date),
        })
        .collect()
}

/// Write `rows` to a single-sheet workbook and return the file bytes.
///
/// The header row is written even when there are no rows.
///
/// # Errors
/// Returns [Error::SpreadsheetError] if the workbook could not be built.
pub fn build_workbook(rows: &[ExportRow], filter: &ExportFilter) -> Result<Vec<u8>, Error> {
    write_workbook(rows, filter).map_err(|error| Error::SpreadsheetError(error.to_string()))
}

fn write_workbook(rows: &[ExportRow], filter: &ExportFilter) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let headers: &[&str] = match filter {
        ExportFilter::All => &["type", "category", "amount", "date"],
        ExportFilter::Type(_) => &["category", "amount", "date"],
    };

    for (column, header) in headers.iter().enumerate() {
        worksheet.write_string(0, column as u16, *header)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let line = index as u32 + 1;
        let mut column = 0;

        if let Some(kind) = row.kind {
            worksheet.write_string(line, column, kind.as_str())?;
            column += 1;
        }

        worksheet.write_string(line, column, &row.category)?;
        worksheet.write_number(line, column + 1, row.amount)?;
        worksheet.write_string(line, column + 2, &row.date)?;
    }

    workbook.save_to_buffer()
}

/// Replace anything that is not safe in a quoted file name.
fn sanitize_file_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// A route handler that sends the caller's transactions for a month as an
/// `.xlsx` attachment.
pub async fn download_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, Error> {
    let period = query.period(OffsetDateTime::now_utc().date())?;
    let filter = ExportFilter::from_query(query.kind.as_deref());

    let transactions = {
        let connection = state.connection()?;
        get_transactions_in_range(user_id, period.date_range()?, None, &connection)
            .inspect_err(|error| {
                tracing::error!("Could not get transactions for export: {error}")
            })?
    };

    let rows = export_rows(&transactions, &filter);
    let buffer = build_workbook(&rows, &filter)?;

    let file_name = format!(
        "{}_details_{}_{}.xlsx",
        sanitize_file_label(filter.label()),
        period.month_number(),
        period.year
    );

    tracing::info!("Exporting {} rows to {file_name} for user {user_id}", rows.len());

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        buffer,
    )
        .into_response())
}
