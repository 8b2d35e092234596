//! Liveness and readiness probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;

use crate::envelope::ApiResponse;
use crate::state::AppState;

/// Liveness payload.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
}

/// Liveness health check endpoint.
///
/// Returns the current time if the server is running. Does not check dependencies.
pub async fn health() -> ApiResponse<HealthStatus> {
    ApiResponse::ok(HealthStatus {
        status: "ok",
        timestamp: food_order_core::timestamp::format(&Utc::now()),
    })
    .with_message("Server is running")
}

/// Readiness health check endpoint.
///
/// Pings the document store. Returns 503 Service Unavailable if it is not reachable.
pub async fn readiness(State(state): State<AppState>) -> Response {
    match state.store().ping().await {
        Ok(()) => ApiResponse::ok(HealthStatus {
            status: "ready",
            timestamp: food_order_core::timestamp::format(&Utc::now()),
        })
        .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiResponse::<()>::error("unavailable", "Document store unreachable"),
            )
                .into_response()
        }
    }
}
