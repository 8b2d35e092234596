//! Order placement and order history.

use std::sync::Arc;

use chrono::Utc;
use food_order_core::{OrderId, OrderStatus, QueueNumber, UserId};
use serde::Deserialize;
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::instrument;

use crate::db::{Direction, DocumentStore, ORDERS, Query, StoreError, encode};
use crate::models::{Identity, NewOrder, Order, OrderReceipt};
use crate::services::sequencer::{QueueSequencer, SequencerError};

/// Most orders returned by [`OrderService::list_for_user`].
pub const ORDER_HISTORY_LIMIT: usize = 20;

const INVALID_ITEMS: &str = "Invalid order: items array is required";
const INVALID_TOTAL: &str = "Invalid order: valid total amount is required";

/// Errors that can occur while placing or listing orders.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The payload failed validation. Nothing was written.
    #[error("{0}")]
    Invalid(&'static str),

    /// No queue number could be assigned. Nothing was written.
    #[error("queue number assignment failed: {0}")]
    Sequencer(#[from] SequencerError),

    /// A queue number was consumed but the order document could not be written.
    ///
    /// The number is never reused.
    #[error("order with queue number {queue_number} could not be stored: {source}")]
    Persist {
        queue_number: QueueNumber,
        source: StoreError,
    },

    /// Reading orders failed.
    #[error("order query failed: {0}")]
    Store(#[from] StoreError),
}

/// Body of a place-order request.
///
/// `items` and `total` are kept as raw JSON so that validation can tell a
/// missing field from a wrongly typed one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Value,
    #[serde(default)]
    pub total: Value,
    #[serde(default)]
    pub encrypted_address: Option<String>,
    #[serde(default)]
    pub encrypted_phone: Option<String>,
}

/// A place-order request that passed validation.
#[derive(Debug, Clone, PartialEq)]
struct ValidOrder {
    items: Vec<Value>,
    total: Number,
    encrypted_address: Option<String>,
    encrypted_phone: Option<String>,
}

impl PlaceOrderRequest {
    fn validate(self) -> Result<ValidOrder, OrderError> {
        let items = match self.items {
            Value::Array(items) if !items.is_empty() => items,
            _ => return Err(OrderError::Invalid(INVALID_ITEMS)),
        };

        let total = match self.total {
            Value::Number(total) if total.as_f64().is_some_and(|t| t.is_finite() && t > 0.0) => {
                total
            }
            _ => return Err(OrderError::Invalid(INVALID_TOTAL)),
        };

        Ok(ValidOrder {
            items,
            total,
            encrypted_address: self.encrypted_address.filter(|s| !s.is_empty()),
            encrypted_phone: self.encrypted_phone.filter(|s| !s.is_empty()),
        })
    }
}

/// Places orders and lists a user's order history.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn DocumentStore>,
    sequencer: Arc<dyn QueueSequencer>,
}

impl OrderService {
    /// Create an order service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, sequencer: Arc<dyn QueueSequencer>) -> Self {
        Self { store, sequencer }
    }

    /// Validate and place an order for `identity`.
    ///
    /// On success exactly one queue number was consumed and exactly one order
    /// document was created.
    ///
    /// # Errors
    ///
    /// - `OrderError::Invalid` if the payload fails validation (no side effects)
    /// - `OrderError::Sequencer` if no queue number could be assigned (no side effects)
    /// - `OrderError::Persist` if the order could not be stored after its number was assigned
    #[instrument(skip(self, identity, request), fields(user_id = %identity.user_id))]
    pub async fn place(
        &self,
        identity: &Identity,
        request: PlaceOrderRequest,
    ) -> Result<OrderReceipt, OrderError> {
        let order = request.validate()?;

        let queue_number = self.sequencer.next_queue_number().await?;

        let now = Utc::now();
        let record = NewOrder {
            user_id: identity.user_id.clone(),
            user_email: identity.email_or_anonymous().to_string(),
            items: order.items,
            total: order.total,
            encrypted_address: order.encrypted_address,
            encrypted_phone: order.encrypted_phone,
            status: OrderStatus::Pending,
            queue_number,
            created_at: now,
            updated_at: now,
        };

        let stored = match encode(&record) {
            Ok(fields) => self.store.add(ORDERS, fields).await,
            Err(err) => Err(err),
        };

        let document = stored.map_err(|source| {
            tracing::error!(
                queue_number = %queue_number,
                error = %source,
                "Queue number consumed but order was not stored"
            );
            OrderError::Persist {
                queue_number,
                source,
            }
        })?;

        let order_id = OrderId::new(document.id);
        tracing::info!(
            order_id = %order_id,
            queue_number = %queue_number,
            "Order placed"
        );

        Ok(OrderReceipt {
            order_id,
            queue_number,
            status: OrderStatus::Pending,
        })
    }

    /// The most recent orders owned by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Store` if the query fails or a stored order is corrupt.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, OrderError> {
        let query = Query::new()
            .where_eq("userId", user_id.as_str())
            .order_by("createdAt", Direction::Descending)
            .limit(ORDER_HISTORY_LIMIT);

        let documents = self.store.query(ORDERS, &query).await?;
        let orders = documents
            .iter()
            .map(crate::db::Document::decode_with_id)
            .collect::<Result<Vec<Order>, _>>()?;

        Ok(orders)
    }
}
