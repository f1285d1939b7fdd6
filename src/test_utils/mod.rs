#![allow(missing_docs)]

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::Connection;
use time::Duration;

use crate::{AppState, Error, UserID, auth::encode_token, receipt::ReceiptScanner};

pub(crate) const TEST_JWT_SECRET: &str = "nafstenoas";

/// A [ReceiptScanner] that always gives the same reply.
pub(crate) struct StubScanner {
    reply: String,
}

impl StubScanner {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_owned(),
        }
    }
}

#[async_trait]
impl ReceiptScanner for StubScanner {
    async fn scan(&self, _image: &[u8], _mime_type: &str) -> Result<String, Error> {
        Ok(self.reply.clone())
    }
}

pub(crate) fn must_create_test_app_state(scanner_reply: &str) -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(
        connection,
        TEST_JWT_SECRET,
        Arc::new(StubScanner::replying(scanner_reply)),
    )
    .expect("Could not create app state.")
}

pub(crate) fn must_create_token(state: &AppState, user_id: UserID) -> String {
    encode_token(user_id, Duration::hours(1), &state.token_keys.encoding)
        .expect("Could not create token.")
}
