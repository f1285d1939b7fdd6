//! Create a bearer token for a user so that they can call the API.

use clap::Parser;
use time::Duration;

use fintrack::{TokenConfig, TokenKeys, UserID, encode_token};

const MAX_EXPIRY_DAYS: i64 = 3650;

fn main() {
    let _ = dotenvy::dotenv();
    let config = TokenConfig::parse();

    if !(1..=MAX_EXPIRY_DAYS).contains(&config.expires_in_days) {
        eprintln!("--expires-in-days must be between 1 and {MAX_EXPIRY_DAYS}");
        std::process::exit(1);
    }

    let keys = TokenKeys::from_secret(config.jwt_secret.as_bytes());

    match encode_token(
        UserID::new(config.user_id),
        Duration::days(config.expires_in_days),
        &keys.encoding,
    ) {
        Ok(token) => println!("{token}"),
        Err(error) => {
            eprintln!("Could not create token: {error}");
            std::process::exit(1);
        }
    }
}
