//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - The monthly period and weekly chart calculations
//! - Route handlers for the transaction API, including the spreadsheet export

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod export_endpoint;
mod list_endpoint;
mod period;
mod state;

pub use core::{Transaction, TransactionType, create_transaction_table, get_user_transactions};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use export_endpoint::download_transactions_endpoint;
pub use list_endpoint::get_transactions_endpoint;

#[cfg(test)]
pub use core::{create_transaction, get_transaction};
