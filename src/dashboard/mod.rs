//! Dashboard module
//!
//! Provides the financial overview: balance totals, the most recent
//! transactions and pie-chart data for them.

mod aggregation;
mod handlers;

pub use handlers::get_dashboard_endpoint;
