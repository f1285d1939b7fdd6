//! The claims carried by a bearer token and how to encode and decode them.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserID};

/// The contents of a JSON Web Token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The user the token was issued to.
    pub id: UserID,
    /// The time the token was issued, in seconds since the Unix epoch.
    pub iat: u64,
    /// The expiry time of the token, in seconds since the Unix epoch.
    pub exp: u64,
}

/// The keys for signing and verifying tokens, derived from one secret.
#[derive(Clone)]
pub struct TokenKeys {
    /// Signs new tokens.
    pub encoding: EncodingKey,
    /// Verifies incoming tokens.
    pub decoding: DecodingKey,
}

impl TokenKeys {
    /// Create HS256 keys from `secret`.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Create a signed token for `user_id` that expires after `duration`.
///
/// # Errors
/// Returns [Error::TokenCreation] if the expiry is before the Unix epoch or
/// the token could not be signed.
pub fn encode_token(
    user_id: UserID,
    duration: Duration,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let iat = unix_seconds(now)?;
    let exp = unix_seconds(now + duration)?;

    let claims = Claims {
        id: user_id,
        iat,
        exp,
    };

    encode(&Header::default(), &claims, encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify `token` and return its claims.
///
/// # Errors
/// Returns [Error::InvalidToken] if the token is malformed, has a bad
/// signature or has expired.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<Claims, Error> {
    decode::<Claims>(token, decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected bearer token: {error}");
            Error::InvalidToken
        })
}

fn unix_seconds(date_time: OffsetDateTime) -> Result<u64, Error> {
    u64::try_from(date_time.unix_timestamp())
        .map_err(|_| Error::TokenCreation(format!("{date_time} is before the Unix epoch")))
}
