//! Menu items.

use food_order_core::{MenuItemId, Price};
use serde::{Deserialize, Serialize};

/// An item on the menu.
///
/// Read-only to clients; written only by seeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Catalog id, also the document id.
    pub id: MenuItemId,
    pub name: String,
    pub description: String,
    /// Unit price.
    pub price: Price,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_wire_format() {
        let item = MenuItem {
            id: MenuItemId::new("1"),
            name: "Burger".to_string(),
            description: "Juicy beef burger".to_string(),
            price: Price::from_cents(1299),
            image_url: "https://images.example.com/burger.jpg".to_string(),
            category: None,
        };

        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "id": "1",
                "name": "Burger",
                "description": "Juicy beef burger",
                "price": 12.99,
                "imageUrl": "https://images.example.com/burger.jpg",
            })
        );
    }

    #[test]
    fn test_category_is_optional_on_read() {
        let item: MenuItem = serde_json::from_value(json!({
            "id": "7",
            "name": "Ramen",
            "description": "Tonkotsu",
            "price": 13.5,
            "imageUrl": "",
            "category": "Noodles",
        }))
        .unwrap();

        assert_eq!(item.category.as_deref(), Some("Noodles"));
        assert_eq!(item.price, Price::from_cents(1350));
    }
}
