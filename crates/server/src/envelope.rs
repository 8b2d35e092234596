//! The JSON envelope every endpoint responds with, and the JSON body extractor.
//!
//! ```text
//! { "success": true,  "data": ..., "message": "..." }
//! { "success": false, "error": "validation_error", "message": "..." }
//! ```

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::AppError;

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// Attach a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Failed response with a category code and a client-safe message.
    #[must_use]
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(code.to_string()),
            message: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `201 Created` with an envelope body.
pub fn created<T: Serialize>(body: ApiResponse<T>) -> Response {
    (StatusCode::CREATED, body).into_response()
}

/// JSON request body whose rejections are validation errors in the envelope
/// format instead of axum's plain-text responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_to_error(&rejection)),
        }
    }
}

fn rejection_to_error(rejection: &JsonRejection) -> AppError {
    let message = match rejection {
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
        JsonRejection::JsonDataError(_) => "Request body has the wrong shape",
        _ => "Invalid request body",
    };
    tracing::debug!(rejection = %rejection.body_text(), "Rejected JSON body");
    AppError::BadRequest(message.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn test_ok_envelope_omits_error() {
        let body = serde_json::to_value(ApiResponse::ok(json!([1, 2]))).unwrap();
        assert_eq!(body, json!({"success": true, "data": [1, 2]}));
    }

    #[test]
    fn test_message_envelope() {
        let body =
            serde_json::to_value(ApiResponse::ok(json!({"status": "ok"})).with_message("Server is running"))
                .unwrap();
        assert_eq!(body["message"], "Server is running");
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let request = http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let err = JsonBody::<Value>::from_request(request, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let response = err.into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_valid_json_is_extracted() {
        let request = http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"Ana"}"#))
            .unwrap();

        let JsonBody(value) = JsonBody::<Value>::from_request(request, &()).await.unwrap();
        assert_eq!(value["name"], "Ana");
    }
}
