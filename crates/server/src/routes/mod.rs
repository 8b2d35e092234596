//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health         - Liveness (no auth)
//! GET  /health/ready   - Readiness, pings the document store (no auth)
//!
//! GET  /menu           - Menu items, built-in defaults while none are stored
//! POST /menu/seed      - Upsert the seed menu (admin only)
//!
//! POST /placeOrder     - Place an order, assigns its queue number
//! GET  /orders         - The caller's 20 most recent orders
//!
//! POST /profile        - Create or update the caller's profile
//! GET  /profile        - The caller's profile
//! ```
//!
//! Every other method on these paths answers 405; unknown paths answer 404.

pub mod health;
pub mod menu;
pub mod orders;
pub mod profile;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{cors_middleware, request_id_middleware};
use crate::state::AppState;

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health).fallback(method_not_allowed))
        .route(
            "/health/ready",
            get(health::readiness).fallback(method_not_allowed),
        )
        .route("/menu", get(menu::list).fallback(method_not_allowed))
        .route("/menu/seed", post(menu::seed).fallback(method_not_allowed))
        .route("/placeOrder", post(orders::place).fallback(method_not_allowed))
        .route("/orders", get(orders::list).fallback(method_not_allowed))
        .route(
            "/profile",
            get(profile::get)
                .post(profile::upsert)
                .fallback(method_not_allowed),
        )
}

/// Build the complete application: routes, middleware and state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes())
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), cors_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
