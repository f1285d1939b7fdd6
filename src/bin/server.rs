use std::{
    fs::OpenOptions,
    net::{IpAddr, SocketAddr},
    process,
    sync::Arc,
    time::Duration,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use fintrack::{
    AppState, GeminiScanner, ServerConfig, build_router, cors_layer, graceful_shutdown,
    logging_middleware,
};

/// How long to wait for the receipt scanner before giving up.
const SCANNER_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    setup_logging();

    let config = ServerConfig::parse();

    let address: IpAddr = match config.address.parse() {
        Ok(address) => address,
        Err(error) => {
            tracing::error!("Invalid address {:?}: {error}", config.address);
            process::exit(1);
        }
    };
    let addr = SocketAddr::from((address, config.port));

    let connection = match Connection::open(&config.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not open database at {}: {error}", config.db_path);
            process::exit(1);
        }
    };
    tracing::info!("Connected to database at {}", config.db_path);

    let client = match reqwest::Client::builder().timeout(SCANNER_TIMEOUT).build() {
        Ok(client) => client,
        Err(error) => {
            tracing::error!("Could not create HTTP client: {error}");
            process::exit(1);
        }
    };
    let scanner = GeminiScanner::new(client, config.gemini_api_key, config.gemini_model)
        .with_base_url(config.gemini_base_url);

    let state = match AppState::new(connection, &config.jwt_secret, Arc::new(scanner)) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not initialize database: {error}");
            process::exit(1);
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state).layer(middleware::from_fn(logging_middleware)),
    )
    .layer(cors_layer(&config.allowed_origins));

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("server stopped unexpectedly");
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fintrack=debug,server=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG)
                .with_filter(env_filter),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
