//! Bearer token authentication extractors.
//!
//! ```rust,ignore
//! async fn handler(RequireAuth(identity): RequireAuth) -> impl IntoResponse {
//!     format!("Hello, {}!", identity.user_id)
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::Identity;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";
const MISSING_HEADER: &str = "Missing or invalid Authorization header";

/// Extractor that requires a verified bearer token.
///
/// Rejects with 401 if the `Authorization` header is missing, is not a
/// `Bearer ` credential, or the token fails verification.
pub struct RequireAuth(pub Identity);

/// Extractor that requires a verified bearer token whose subject is an admin.
///
/// Rejects with 401 like [`RequireAuth`], then with 403 for non-admins.
pub struct RequireAdmin(pub Identity);

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized(MISSING_HEADER))?;

        let identity = state.verifier().verify(token).await.map_err(|err| {
            if err.is_rejection() {
                tracing::debug!(error = %err, "Token verification failed");
            }
            AppError::Identity(err)
        })?;

        set_sentry_user(&identity.user_id, identity.email.as_deref());
        tracing::Span::current().record("user_id", identity.user_id.as_str());

        Ok(Self(identity))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(identity) = RequireAuth::from_request_parts(parts, state).await?;

        if !state.config().is_admin(&identity.user_id) {
            tracing::warn!(user_id = %identity.user_id, "Non-admin attempted an admin operation");
            return Err(AppError::Forbidden("Admin access required"));
        }

        Ok(Self(identity))
    }
}
