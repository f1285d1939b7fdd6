//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::Request,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Bodies longer than this many bytes are truncated at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest body the middleware will buffer for logging.
///
/// The receipt upload route has its own, larger limit and its bodies are
/// never buffered here.
const MAX_BUFFERED_BODY: usize = 2 * 1024 * 1024;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and logged in full at the `debug` level. Binary bodies such as
/// uploaded images and spreadsheets are not logged, and the bearer token is
/// redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let headers = redact_authorization(&parts.headers);

    let request = if is_text(&parts.headers) {
        let body_bytes = match to_bytes(body, MAX_BUFFERED_BODY).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::debug!("Could not read request body: {error}");
                return (StatusCode::PAYLOAD_TOO_LARGE, "Request body is too large")
                    .into_response();
            }
        };

        log_request(&parts.method, &parts.uri, &headers, &body_text(&body_bytes));
        Request::from_parts(parts, Body::from(body_bytes))
    } else {
        log_request(&parts.method, &parts.uri, &headers, "<binary>");
        Request::from_parts(parts, body)
    };

    let response = next.run(request).await;
    let (parts, body) = response.into_parts();

    if !is_text(&parts.headers) {
        log_response(parts.status, &parts.headers, "<binary>");
        return Response::from_parts(parts, body);
    }

    let body_bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log_response(parts.status, &parts.headers, &body_text(&body_bytes));
    Response::from_parts(parts, Body::from(body_bytes))
}

/// Whether the body is JSON or plain text, or there is no content type at all.
fn is_text(headers: &HeaderMap) -> bool {
    match headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()) {
        None => true,
        Some(content_type) => {
            content_type.starts_with("application/json") || content_type.starts_with("text/")
        }
    }
}

fn redact_authorization(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    if headers.contains_key(AUTHORIZATION) {
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer ********"));
    }

    headers
}

fn body_text(bytes: &Bytes) -> String {
    String::from_utf8_lossy(bytes).to_string()
}

/// Cut `text` to at most [LOG_BODY_LENGTH_LIMIT] bytes without splitting a character.
fn truncate(text: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(text.len());

    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_request(
    method: &axum::http::Method,
    uri: &axum::http::Uri,
    headers: &HeaderMap,
    body: &str,
) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {method} {uri} {headers:?}\nbody: {:}...",
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {method} {uri} {headers:?}\nbody: {body:?}");
    }
}

fn log_response(status: StatusCode, headers: &HeaderMap, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {status} {headers:?}\nbody: {:}...",
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {status} {headers:?}\nbody: {body:?}");
    }
}
