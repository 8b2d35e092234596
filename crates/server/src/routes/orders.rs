//! Order route handlers.

use axum::{extract::State, response::Response};

use crate::envelope::{ApiResponse, JsonBody, created};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::orders::PlaceOrderRequest;
use crate::state::AppState;

/// `POST /placeOrder`
pub async fn place(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<PlaceOrderRequest>,
) -> Result<Response> {
    let receipt = state.orders().place(&identity, request).await?;

    Ok(created(
        ApiResponse::ok(receipt).with_message("Order placed successfully"),
    ))
}

/// `GET /orders`
pub async fn list(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Order>>> {
    let orders = state.orders().list_for_user(&identity.user_id).await?;
    Ok(ApiResponse::ok(orders))
}
