//! Bearer token authentication.
//!
//! Tokens are issued elsewhere (see the `issue_token` binary) and only
//! verified here.

mod middleware;
mod token;

pub use middleware::auth_guard;
pub use token::{Claims, TokenKeys, encode_token};

#[cfg(test)]
pub use middleware::AuthState;
