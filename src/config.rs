//! Command line and environment configuration for the binaries.

use clap::Parser;

use crate::receipt::DEFAULT_GEMINI_BASE_URL;

/// The REST API server for fintrack.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about, long_about = None)]
pub struct ServerConfig {
    /// File path to the application SQLite database.
    #[arg(long, env = "DATABASE_PATH")]
    pub db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// The IP address to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    pub address: String,

    /// The secret used to verify bearer tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// The API key for the Gemini receipt scanner.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: String,

    /// The Gemini model used to read receipts.
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.5-flash")]
    pub gemini_model: String,

    /// The base URL of the Gemini API.
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub gemini_base_url: String,

    /// An origin allowed to make cross-origin requests. May be repeated.
    #[arg(
        long = "allowed-origin",
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173"
    )]
    pub allowed_origins: Vec<String>,
}

/// Create a bearer token for a user.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about, long_about = None)]
pub struct TokenConfig {
    /// The ID of the user the token is for.
    #[arg(long)]
    pub user_id: i64,

    /// How many days the token stays valid.
    #[arg(long, default_value_t = 30)]
    pub expires_in_days: i64,

    /// The secret used to sign the token.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::config::{ServerConfig, TokenConfig};

    #[test]
    fn server_config_uses_defaults() {
        let config = ServerConfig::try_parse_from([
            "server",
            "--db-path",
            "app.db",
            "--jwt-secret",
            "secret",
            "--gemini-api-key",
            "key",
        ])
        .unwrap();

        assert_eq!(config.db_path, "app.db");
        assert_eq!(config.port, 3000);
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(
            config.gemini_base_url,
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(config.allowed_origins, vec!["http://localhost:5173"]);
    }

    #[test]
    fn server_config_accepts_several_origins() {
        let config = ServerConfig::try_parse_from([
            "server",
            "--db-path",
            "app.db",
            "--jwt-secret",
            "secret",
            "--gemini-api-key",
            "key",
            "--allowed-origin",
            "https://a.example,https://b.example",
            "--allowed-origin",
            "https://c.example",
        ])
        .unwrap();

        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example", "https://c.example"]
        );
    }

    #[test]
    fn token_config_defaults_to_thirty_days() {
        let config =
            TokenConfig::try_parse_from(["issue_token", "--user-id", "5", "--jwt-secret", "s"])
                .unwrap();

        assert_eq!(config.user_id, 5);
        assert_eq!(config.expires_in_days, 30);
    }
}
