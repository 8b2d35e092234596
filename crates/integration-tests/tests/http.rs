//! Integration tests for cross-cutting HTTP behavior: health probes, CORS,
//! request ids, and method/path handling.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use food_order_integration_tests::{DINER_TOKEN, TestApp};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let response = app.get("/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["message"], "Server is running");
    assert_eq!(response.body["data"]["status"], "ok");
    assert!(response.body["data"]["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_readiness() {
    let app = TestApp::new();

    let response = app.get("/health/ready", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ready");
}

#[tokio::test]
async fn test_preflight_returns_no_content_with_cors_headers() {
    let app = TestApp::new();

    for path in ["/placeOrder", "/menu", "/orders", "/profile"] {
        let response = app.request(Method::OPTIONS, path, None, None).await;

        assert_eq!(response.status, StatusCode::NO_CONTENT, "{path}");
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
        assert_eq!(
            response.header("access-control-allow-methods"),
            Some("GET, POST, OPTIONS")
        );
        assert_eq!(
            response.header("access-control-allow-headers"),
            Some("Content-Type, Authorization")
        );
        assert!(response.body.is_null());
    }

    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn test_cors_headers_on_regular_and_error_responses() {
    let app = TestApp::new();

    let ok = app.get("/menu", Some(DINER_TOKEN)).await;
    assert_eq!(ok.header("access-control-allow-origin"), Some("*"));

    let unauthorized = app.get("/menu", None).await;
    assert_eq!(unauthorized.header("access-control-allow-origin"), Some("*"));
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let app = TestApp::new();

    let cases = [
        (Method::GET, "/placeOrder"),
        (Method::POST, "/orders"),
        (Method::DELETE, "/menu"),
        (Method::PUT, "/profile"),
        (Method::GET, "/menu/seed"),
    ];

    for (method, path) in cases {
        let response = app.request(method.clone(), path, Some(DINER_TOKEN), None).await;

        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED, "{method} {path}");
        assert_eq!(response.body["success"], false);
        assert_eq!(response.body["error"], "method_not_allowed");
        assert_eq!(response.body["message"], "Method not allowed");
    }

    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let app = TestApp::new();

    let response = app.get("/checkout", Some(DINER_TOKEN)).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"], "not_found");
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.header("x-request-id"), Some("trace-abc-123"));

    let response = app.get("/health", None).await;
    assert!(response.header("x-request-id").is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_error_responses_are_json() {
    let app = TestApp::new();

    let response = app.get("/orders", None).await;

    assert_eq!(
        response.header(header::CONTENT_TYPE.as_str()),
        Some("application/json")
    );
}
