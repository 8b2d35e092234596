//! Orders and the receipt returned when one is placed.

use chrono::{DateTime, Utc};
use food_order_core::{OrderId, OrderStatus, QueueNumber, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// An order as written to the `orders` collection.
///
/// The document id is assigned by the store, so it is not part of the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: UserId,
    /// Owner email, `"anonymous"` when the identity carried none.
    pub user_email: String,
    /// Line items exactly as the client sent them.
    pub items: Vec<Value>,
    /// Finite positive total, stored exactly as the client sent it.
    pub total: Number,
    pub encrypted_address: Option<String>,
    pub encrypted_phone: Option<String>,
    pub status: OrderStatus,
    pub queue_number: QueueNumber,
    #[serde(with = "food_order_core::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "food_order_core::timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// A stored order, as returned by the order listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_email: String,
    pub items: Vec<Value>,
    pub total: Number,
    #[serde(default)]
    pub encrypted_address: Option<String>,
    #[serde(default)]
    pub encrypted_phone: Option<String>,
    pub status: OrderStatus,
    pub queue_number: QueueNumber,
    #[serde(with = "food_order_core::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "food_order_core::timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// What the client learns about an order it just placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub queue_number: QueueNumber,
    pub status: OrderStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn sample() -> NewOrder {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        NewOrder {
            user_id: UserId::new("u1"),
            user_email: "anonymous".to_string(),
            items: vec![json!({"id": "1", "quantity": 2})],
            total: Number::from_f64(25.98).unwrap(),
            encrypted_address: None,
            encrypted_phone: Some("cipher".to_string()),
            status: OrderStatus::Pending,
            queue_number: QueueNumber::FIRST,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_new_order_document_shape() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["userId"], "u1");
        assert_eq!(value["total"], json!(25.98));
        assert_eq!(value["encryptedAddress"], Value::Null);
        assert_eq!(value["status"], "pending");
        assert_eq!(value["queueNumber"], 1);
        assert_eq!(value["createdAt"], "2026-03-01T12:00:00.000Z");
    }

    #[test]
    fn test_order_reads_stored_record() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["id"] = json!("abc123");

        let order: Order = serde_json::from_value(value).unwrap();
        assert_eq!(order.id, OrderId::new("abc123"));
        assert_eq!(order.queue_number, QueueNumber::FIRST);
        assert_eq!(order.encrypted_phone.as_deref(), Some("cipher"));
    }

    #[test]
    fn test_receipt_wire_format() {
        let receipt = OrderReceipt {
            order_id: OrderId::new("abc123"),
            queue_number: QueueNumber::new(42).unwrap(),
            status: OrderStatus::Pending,
        };

        assert_eq!(
            serde_json::to_value(receipt).unwrap(),
            json!({"orderId": "abc123", "queueNumber": 42, "status": "pending"})
        );
    }
}
