//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/transactions/{transaction_id}', use [format_endpoint].

/// The health check route.
pub const ROOT: &str = "/";
/// The route for listing and creating transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route for updating and deleting a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for downloading a month of transactions as a spreadsheet.
pub const DOWNLOAD_EXCEL: &str = "/api/transactions/downloadexcel";
/// The route for extracting transaction details from a receipt image.
pub const SCAN_RECEIPT: &str = "/api/transactions/scanreceipt";
/// The route for the dashboard report.
pub const DASHBOARD_API: &str = "/api/dashboard";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
