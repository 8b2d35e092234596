//! Menu route handlers.

use axum::extract::State;

use crate::envelope::ApiResponse;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::MenuItem;
use crate::state::AppState;

/// `GET /menu`
pub async fn list(
    RequireAuth(_identity): RequireAuth,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<MenuItem>>> {
    let items = state
        .menu()
        .list()
        .await
        .map_err(AppError::store("Failed to fetch menu items"))?;

    Ok(ApiResponse::ok(items))
}

/// `POST /menu/seed`
pub async fn seed(
    RequireAdmin(identity): RequireAdmin,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<MenuItem>>> {
    let items = state
        .menu()
        .seed()
        .await
        .map_err(AppError::store("Failed to seed menu"))?;

    tracing::info!(user_id = %identity.user_id, "Menu seeded over HTTP");
    Ok(ApiResponse::ok(items).with_message("Menu seeded successfully"))
}
