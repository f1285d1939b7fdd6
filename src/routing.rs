//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    AppState,
    auth::auth_guard,
    dashboard::get_dashboard_endpoint,
    endpoints,
    receipt::{MAX_RECEIPT_SIZE, scan_receipt_endpoint},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint,
        download_transactions_endpoint, edit_transaction_endpoint, get_transactions_endpoint,
    },
};

/// Room for the multipart boundaries and headers around the receipt image.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::ROOT, get(get_health));

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS_API,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::DOWNLOAD_EXCEL,
            get(download_transactions_endpoint),
        )
        .route(
            endpoints::SCAN_RECEIPT,
            post(scan_receipt_endpoint)
                .layer(DefaultBodyLimit::max(MAX_RECEIPT_SIZE + MULTIPART_OVERHEAD)),
        )
        .route(endpoints::DASHBOARD_API, get(get_dashboard_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes.merge(unprotected_routes).with_state(state)
}

/// Lets clients know the server is up.
async fn get_health() -> &'static str {
    "Finance tracker backend is running"
}

/// Build the CORS layer for the browser front end.
///
/// Origins that are not valid header values are skipped with a warning.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|error| tracing::warn!("Ignoring allowed origin {origin:?}: {error}"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
