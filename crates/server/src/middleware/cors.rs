//! CORS handling.
//!
//! Every path answers `OPTIONS` with `204 No Content` before routing, method
//! checks or authentication run. All other responses, errors included, carry
//! the same `Access-Control-*` headers.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Value of `Access-Control-Allow-Methods`.
pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Value of `Access-Control-Allow-Headers`.
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Answer preflight requests and add CORS headers to every response.
pub async fn cors_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let origin = HeaderValue::from_str(&state.config().cors_allow_origin)
        .unwrap_or_else(|_| HeaderValue::from_static("*"));

    let mut response = if request.method() == Method::OPTIONS {
        let mut preflight = Response::new(Body::empty());
        *preflight.status_mut() = StatusCode::NO_CONTENT;
        preflight
    } else {
        next.run(request).await
    };

    apply_cors_headers(response.headers_mut(), origin);
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
}
