//! Food ordering API server.
//!
//! Serves the menu, order placement, order history and profile endpoints
//! consumed by the food ordering client.
//!
//! # Architecture
//!
//! - Axum web framework, JSON envelope responses
//! - Bearer tokens verified against the identity provider's account lookup
//! - `PostgreSQL` document store, or an in-memory store when no database is configured
//! - Queue numbers assigned by a transactional counter document

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use food_order_server::config::ServerConfig;
use food_order_server::db;
use food_order_server::routes;
use food_order_server::services::AccountLookupVerifier;
use food_order_server::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "food_order_server=info,tower_http=debug".into());

    // Use JSON format on Cloud Run for structured log parsing, text format locally
    let is_cloud_run = std::env::var("K_SERVICE").is_ok();
    let json_layer =
        is_cloud_run.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_cloud_run).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // NOTE: Migrations are NOT run on startup. Run them via: food-order-cli migrate

    let store = db::create_store(&config)
        .await
        .expect("Failed to create document store");

    let verifier = AccountLookupVerifier::new(&config.identity)
        .expect("Failed to create identity verifier");

    let state = AppState::new(config.clone(), store, Arc::new(verifier));
    let app = routes::build_router(state);

    let addr = config.socket_addr();
    tracing::info!("food-order-server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
