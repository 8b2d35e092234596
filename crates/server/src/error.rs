//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Clients receive the JSON envelope `{ success: false, error, message }`
//! where `error` is a coarse category code and `message` never contains
//! internal detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::StoreError;
use crate::envelope::ApiResponse;
use crate::services::identity::IdentityError;
use crate::services::orders::OrderError;
use crate::services::profiles::ProfileError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Order placement or listing failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Profile operation failed.
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// Token verification failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Store operation failed while serving a request.
    #[error("{action}: {source}")]
    Store {
        /// Generic message shown to the client.
        action: &'static str,
        #[source]
        source: StoreError,
    },

    /// Missing or malformed `Authorization` header.
    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Authenticated, but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The path exists but not for this HTTP method.
    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl AppError {
    /// Wrap a store failure with the generic message for `action`.
    ///
    /// ```rust,ignore
    /// let items = menu.list().await.map_err(AppError::store("Failed to fetch menu items"))?;
    /// ```
    pub fn store(action: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { action, source }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Order(OrderError::Invalid(_))
            | Self::Profile(ProfileError::MissingName | ProfileError::InvalidEmail(_))
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Profile(ProfileError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Identity(IdentityError::InvalidToken) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Order(_) | Self::Profile(_) | Self::Identity(_) | Self::Store { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Category code sent in the `error` field.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self.status().as_u16() {
            400 => "validation_error",
            401 => "unauthorized",
            403 => "forbidden",
            404 => "not_found",
            405 => "method_not_allowed",
            _ => "internal_error",
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Order(OrderError::Invalid(message)) => (*message).to_string(),
            Self::Order(OrderError::Store(_)) => "Failed to fetch orders".to_string(),
            Self::Order(_) => "Failed to place order".to_string(),
            Self::Profile(ProfileError::MissingName) => "Name is required".to_string(),
            Self::Profile(ProfileError::InvalidEmail(_)) => "Invalid email address".to_string(),
            Self::Profile(ProfileError::NotFound) => "Profile not found".to_string(),
            Self::Profile(ProfileError::Store(_)) => "Failed to process profile".to_string(),
            Self::Identity(IdentityError::InvalidToken) => {
                "Unauthorized: Invalid or expired token".to_string()
            }
            Self::Identity(_) => "Failed to verify credentials".to_string(),
            Self::Store { action, .. } => (*action).to_string(),
            Self::Unauthorized(reason) => format!("Unauthorized: {reason}"),
            Self::Forbidden(reason) => (*reason).to_string(),
            Self::BadRequest(message) | Self::NotFound(message) => message.clone(),
            Self::MethodNotAllowed => "Method not allowed".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ApiResponse::<()>::error(self.code(), self.public_message());
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
