//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, auth::TokenKeys, db::initialize, receipt::ReceiptScanner};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The keys for signing and verifying bearer tokens.
    pub token_keys: TokenKeys,

    /// The service that reads receipt images.
    pub receipt_scanner: Arc<dyn ReceiptScanner>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        receipt_scanner: Arc<dyn ReceiptScanner>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            token_keys: TokenKeys::from_secret(jwt_secret.as_bytes()),
            receipt_scanner,
        })
    }
}
