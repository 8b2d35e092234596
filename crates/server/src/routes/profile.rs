//! Profile route handlers.

use axum::{extract::State, response::Response};

use crate::envelope::{ApiResponse, JsonBody, created};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::UserProfile;
use crate::services::profiles::UpsertProfileRequest;
use crate::state::AppState;

/// `POST /profile`
pub async fn upsert(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UpsertProfileRequest>,
) -> Result<Response> {
    let profile = state.profiles().upsert(&identity, request).await?;
    Ok(created(
        ApiResponse::ok(profile).with_message("Profile saved successfully"),
    ))
}

/// `GET /profile`
pub async fn get(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
) -> Result<ApiResponse<UserProfile>> {
    let profile = state.profiles().get(&identity.user_id).await?;
    Ok(ApiResponse::ok(profile))
}
