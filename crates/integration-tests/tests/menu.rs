//! Integration tests for menu listing and seeding.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use food_order_integration_tests::{ADMIN_TOKEN, DINER_TOKEN, TestApp};
use food_order_server::db::MENU;

#[tokio::test]
async fn test_empty_menu_serves_defaults() {
    let app = TestApp::new();

    let response = app.get("/menu", Some(DINER_TOKEN)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);

    let items = response.body["data"].as_array().unwrap();
    let names: Vec<_> = items.iter().map(|i| i["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Burger", "Pizza", "Sushi", "Pasta", "Salad", "Tacos"]);

    assert_eq!(items[0]["id"], "1");
    assert_eq!(items[0]["price"], 12.99);
    assert!(items[0]["imageUrl"].as_str().unwrap().starts_with("https://"));
    assert!(items[0].get("category").is_none());

    // Defaults are not persisted
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn test_menu_requires_bearer_token() {
    let app = TestApp::new();
    let response = app.get("/menu", None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
}

#[tokio::test]
async fn test_seed_requires_admin() {
    let app = TestApp::new();

    let response = app
        .request(Method::POST, "/menu/seed", Some(DINER_TOKEN), None)
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "forbidden");
    assert_eq!(app.store.document_count(MENU), 0);

    let response = app.request(Method::POST, "/menu/seed", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_seed_then_list_returns_stored_items() {
    let app = TestApp::new();

    let response = app
        .request(Method::POST, "/menu/seed", Some(ADMIN_TOKEN), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Menu seeded successfully");
    assert_eq!(response.body["data"].as_array().unwrap().len(), 6);
    assert_eq!(app.store.document_count(MENU), 6);

    // Re-seeding upserts in place
    app.request(Method::POST, "/menu/seed", Some(ADMIN_TOKEN), None)
        .await;
    assert_eq!(app.store.document_count(MENU), 6);

    let response = app.get("/menu", Some(DINER_TOKEN)).await;
    let items = response.body["data"].as_array().unwrap();
    assert_eq!(items.len(), 6);
    assert!(items.iter().all(|i| i["category"].is_string()));
    assert!(items.iter().any(|i| i["id"] == "3" && i["category"] == "Japanese"));
}
