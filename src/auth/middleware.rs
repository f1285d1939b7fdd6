//! Authentication middleware that verifies bearer tokens.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::DecodingKey;

use crate::{AppState, Error, auth::token::decode_token};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key for verifying token signatures.
    pub decoding_key: DecodingKey,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            decoding_key: state.token_keys.decoding.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
/// The user ID is placed into request and then the request executed normally if the token is valid, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer =
        match TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &state).await {
            Ok(TypedHeader(Authorization(bearer))) => bearer,
            Err(rejection) if rejection.is_missing() => {
                return Error::MissingToken.into_response();
            }
            Err(rejection) => {
                tracing::debug!("Invalid authorization header: {rejection}");
                return Error::InvalidToken.into_response();
            }
        };

    let claims = match decode_token(bearer.token(), &state.decoding_key) {
        Ok(claims) => claims,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(claims.id);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{Extension, Router, middleware, routing::get};
    use axum_test::TestServer;
    use serde_json::json;
    use time::Duration;

    use crate::{
        UserID,
        auth::{AuthState, TokenKeys, auth_guard, encode_token},
    };

    async fn test_handler(Extension(user_id): Extension<UserID>) -> String {
        format!("Hello, user {user_id}!")
    }

    const TEST_PROTECTED_ROUTE: &str = "/protected";

    fn get_test_server(keys: &TokenKeys) -> TestServer {
        let state = AuthState {
            decoding_key: keys.decoding.clone(),
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn get_protected_route_with_valid_token() {
        let keys = TokenKeys::from_secret(b"nafstenoas");
        let server = get_test_server(&keys);
        let token = encode_token(UserID::new(7), Duration::days(1), &keys.encoding).unwrap();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        response.assert_text("Hello, user 7!");
    }

    #[tokio::test]
    async fn get_protected_route_without_token() {
        let server = get_test_server(&TokenKeys::from_secret(b"nafstenoas"));

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status_unauthorized();
        response.assert_json(&json!({"message": "Not authorized, no token"}));
    }

    #[tokio::test]
    async fn get_protected_route_with_invalid_token() {
        let server = get_test_server(&TokenKeys::from_secret(b"nafstenoas"));

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer("FOOBAR")
            .await;

        response.assert_status_unauthorized();
        response.assert_json(&json!({"message": "Not authorized, token failed"}));
    }

    #[tokio::test]
    async fn get_protected_route_with_token_from_other_secret() {
        let server = get_test_server(&TokenKeys::from_secret(b"nafstenoas"));
        let other_keys = TokenKeys::from_secret(b"something else");
        let token = encode_token(UserID::new(7), Duration::days(1), &other_keys.encoding).unwrap();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn get_protected_route_with_basic_auth() {
        let server = get_test_server(&TokenKeys::from_secret(b"nafstenoas"));

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization("Basic Zm9vOmJhcg==")
            .await;

        response.assert_status_unauthorized();
        response.assert_json(&json!({"message": "Not authorized, token failed"}));
    }
}
