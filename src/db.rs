//! Creates the application's database schema and guards access to the
//! shared connection.

use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::{Error, transaction::create_transaction_table};

/// Create all of the application's tables and indexes if they do not exist.
///
/// The schema is created inside a single SQL transaction so a failure leaves
/// the database untouched.
///
/// # Errors
/// Returns an [Error::SqlError] if any of the statements fail.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Lock the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock_connection(
    db_connection: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}
