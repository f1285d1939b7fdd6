//! Fintrack is a backend for tracking personal income and expenses.
//!
//! This library provides a JSON REST API for recording transactions,
//! viewing monthly and overall reports, exporting transactions as a
//! spreadsheet and extracting transaction details from photos of receipts.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod app_state;
mod auth;
mod config;
mod dashboard;
mod database_id;
mod datetime;
mod db;
mod endpoints;
mod logging;
mod receipt;
mod routing;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{Claims, TokenKeys, encode_token};
pub use config::{ServerConfig, TokenConfig};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use receipt::{DEFAULT_GEMINI_BASE_URL, GeminiScanner, ReceiptScanner};
pub use routing::{build_router, cors_layer};
pub use user::UserID;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One of the fields every transaction needs (type, amount, category)
    /// was missing or empty.
    #[error("type, amount and category are required")]
    MissingRequiredFields,

    /// The transaction type was something other than "income" or "expense".
    #[error("\"{0}\" is not a valid transaction type")]
    InvalidTransactionType(String),

    /// The amount of a transaction was zero or negative.
    #[error("{0} is not a positive amount")]
    NonPositiveAmount(f64),

    /// The note attached to a transaction was longer than
    /// 500 characters.
    #[error("the note is {0} characters long")]
    NoteTooLong(usize),

    /// An update tried to set the category to an empty string.
    #[error("category cannot be empty")]
    EmptyCategory,

    /// A date string could not be parsed as an RFC 3339 date-time or a
    /// `YYYY-MM-DD` date.
    #[error("could not parse the date \"{0}\"")]
    InvalidDate(String),

    /// The month of a period was outside the range 1 to 12.
    #[error("{0} is not a valid month")]
    InvalidMonth(i64),

    /// The year of a period could not be represented as a date.
    #[error("{0} is not a valid year")]
    InvalidYear(i64),

    /// The requested resource was not found, or it belongs to another user.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The request did not include a bearer token.
    #[error("no bearer token in the request")]
    MissingToken,

    /// The bearer token could not be decoded, had an invalid signature or had
    /// expired.
    #[error("the bearer token is invalid")]
    InvalidToken,

    /// A token could not be created.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// The receipt upload did not contain a file.
    #[error("no file in the upload")]
    NoFileUploaded,

    /// The uploaded file was not an image.
    #[error("the uploaded file is not an image")]
    NotAnImage,

    /// The uploaded file was larger than 5 MiB.
    #[error("the uploaded file is too large")]
    FileTooLarge,

    /// The multipart form could not be parsed.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The AI service did not recognise the image as a receipt.
    #[error("the image does not look like a receipt")]
    NotAReceipt,

    /// The request to the AI service failed.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("receipt scan failed: {0}")]
    ReceiptScanError(String),

    /// The AI service responded with text that was not the expected JSON.
    #[error("could not parse receipt scan response: {0}")]
    InvalidReceiptResponse(String),

    /// The spreadsheet for an export could not be written.
    #[error("could not create spreadsheet: {0}")]
    SpreadsheetError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to clients when a request fails.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Error {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            Error::MissingRequiredFields => (
                StatusCode::BAD_REQUEST,
                "Type, Amount and Category fields are necessary",
            ),
            Error::InvalidTransactionType(_) => (
                StatusCode::BAD_REQUEST,
                "Type must be 'income' or 'expense'",
            ),
            Error::NonPositiveAmount(_) => {
                (StatusCode::BAD_REQUEST, "Amount must be greater than 0")
            }
            Error::NoteTooLong(_) => (
                StatusCode::BAD_REQUEST,
                "Note cannot exceed 500 characters",
            ),
            Error::EmptyCategory => (StatusCode::BAD_REQUEST, "Category cannot be empty"),
            Error::InvalidDate(_) => (StatusCode::BAD_REQUEST, "Validation error"),
            Error::InvalidMonth(_) => (StatusCode::BAD_REQUEST, "Month must be between 1 and 12"),
            Error::InvalidYear(_) => (StatusCode::BAD_REQUEST, "Year is out of range"),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "Transaction not found or unauthorized",
            ),
            Error::MissingToken => (StatusCode::UNAUTHORIZED, "Not authorized, no token"),
            Error::InvalidToken => (StatusCode::UNAUTHORIZED, "Not authorized, token failed"),
            Error::NoFileUploaded => (StatusCode::BAD_REQUEST, "No file uploaded"),
            Error::NotAnImage => (StatusCode::BAD_REQUEST, "Only image files are allowed"),
            Error::FileTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "File is too large"),
            Error::MultipartError(_) => (StatusCode::BAD_REQUEST, "Could not read the upload"),
            Error::NotAReceipt => (
                StatusCode::BAD_REQUEST,
                "Could not extract receipt information from image",
            ),
            Error::TokenCreation(_)
            | Error::ReceiptScanError(_)
            | Error::InvalidReceiptResponse(_)
            | Error::SpreadsheetError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Details of server-side failures are logged, not sent to the client.
        let error = if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
            None
        } else {
            tracing::debug!("Rejected request: {}", self);
            match self {
                Error::InvalidDate(_) | Error::MultipartError(_) => Some(self.to_string()),
                _ => None,
            }
        };

        let body = ErrorBody {
            message: message.to_owned(),
            error,
        };

        (status, Json(body)).into_response()
    }
}
