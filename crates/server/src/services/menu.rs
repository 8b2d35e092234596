//! Menu listing and seeding.

use std::sync::Arc;

use food_order_core::{MenuItemId, Price};
use tracing::instrument;

use crate::db::{Document, DocumentStore, MENU, StoreError, encode};
use crate::models::MenuItem;

/// Static description of a built-in menu item.
struct CatalogEntry {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    price_cents: u32,
    image_url: &'static str,
    category: &'static str,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        id: "1",
        name: "Burger",
        description: "Juicy beef burger with fresh vegetables",
        price_cents: 1299,
        image_url: "https://images.unsplash.com/photo-1568901346375-23c9450c58cd?w=400",
        category: "Mains",
    },
    CatalogEntry {
        id: "2",
        name: "Pizza",
        description: "Classic Italian pizza with mozzarella and tomato sauce",
        price_cents: 1599,
        image_url: "https://images.unsplash.com/photo-1565299624946-b28f40a0ae38?w=400",
        category: "Mains",
    },
    CatalogEntry {
        id: "3",
        name: "Sushi",
        description: "Fresh salmon sushi rolls with wasabi and ginger",
        price_cents: 1899,
        image_url: "https://images.unsplash.com/photo-1579871494447-9811cf80d66c?w=400",
        category: "Japanese",
    },
    CatalogEntry {
        id: "4",
        name: "Pasta",
        description: "Creamy carbonara pasta with crispy bacon",
        price_cents: 1499,
        image_url: "https://images.unsplash.com/photo-1612874742237-6526221588e3?w=400",
        category: "Mains",
    },
    CatalogEntry {
        id: "5",
        name: "Salad",
        description: "Fresh garden salad with grilled chicken",
        price_cents: 1099,
        image_url: "https://images.unsplash.com/photo-1546793665-c74683f339c1?w=400",
        category: "Healthy",
    },
    CatalogEntry {
        id: "6",
        name: "Tacos",
        description: "Authentic Mexican tacos with seasoned beef",
        price_cents: 1199,
        image_url: "https://images.unsplash.com/photo-1565299585323-38d6b0865b47?w=400",
        category: "Mexican",
    },
];

impl CatalogEntry {
    fn to_item(&self, with_category: bool) -> MenuItem {
        MenuItem {
            id: MenuItemId::new(self.id),
            name: self.name.to_string(),
            description: self.description.to_string(),
            price: Price::from_cents(self.price_cents),
            image_url: self.image_url.to_string(),
            category: with_category.then(|| self.category.to_string()),
        }
    }
}

/// Menu returned while the `menu` collection is empty.
#[must_use]
pub fn default_menu() -> Vec<MenuItem> {
    CATALOG.iter().map(|entry| entry.to_item(false)).collect()
}

/// Menu written by seeding: the default items, categorized.
#[must_use]
pub fn seed_menu() -> Vec<MenuItem> {
    CATALOG.iter().map(|entry| entry.to_item(true)).collect()
}

/// Lists and seeds the menu.
#[derive(Clone)]
pub struct MenuService {
    store: Arc<dyn DocumentStore>,
}

impl MenuService {
    /// Create a menu service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Every stored menu item, or [`default_menu`] if none are stored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails or a stored item is corrupt.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<MenuItem>, StoreError> {
        let documents = self.store.list(MENU).await?;
        if documents.is_empty() {
            tracing::debug!("Menu collection empty, serving default menu");
            return Ok(default_menu());
        }

        documents.iter().map(Document::decode_with_id).collect()
    }

    /// Upsert the [`seed_menu`] items by id in one batch.
    ///
    /// Re-running it leaves the collection in the same state.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the batch write fails.
    #[instrument(skip(self))]
    pub async fn seed(&self) -> Result<Vec<MenuItem>, StoreError> {
        let items = seed_menu();
        let documents = items
            .iter()
            .map(|item| {
                let mut fields = encode(item)?;
                fields.remove("id");
                Ok(Document::new(item.id.as_str(), fields))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        self.store.set_all(MENU, documents).await?;
        tracing::info!(count = items.len(), "Menu seeded");

        Ok(items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryDocumentStore;

    #[test]
    fn test_default_menu_has_no_categories() {
        let menu = default_menu();
        assert_eq!(menu.len(), 6);
        assert_eq!(menu[0].name, "Burger");
        assert_eq!(menu[0].price, Price::from_cents(1299));
        assert!(menu.iter().all(|item| item.category.is_none()));
    }

    #[tokio::test]
    async fn test_empty_store_falls_back_to_defaults() {
        let store = Arc::new(MemoryDocumentStore::new());
        let menu = MenuService::new(store.clone()).list().await.unwrap();

        assert_eq!(menu, default_menu());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_seed_then_list_returns_seeded_items() {
        let store = Arc::new(MemoryDocumentStore::new());
        let service = MenuService::new(store.clone());

        let seeded = service.seed().await.unwrap();
        assert_eq!(service.list().await.unwrap(), seeded);
        assert_eq!(store.document_count(MENU), 6);
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = Arc::new(MemoryDocumentStore::new());
        let service = MenuService::new(store.clone());

        service.seed().await.unwrap();
        service.seed().await.unwrap();

        assert_eq!(store.document_count(MENU), 6);
        assert_eq!(service.list().await.unwrap(), seed_menu());
    }

    #[tokio::test]
    async fn test_stored_menu_replaces_defaults() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mut fields = crate::db::Fields::new();
        fields.insert("name".into(), "Ramen".into());
        fields.insert("description".into(), "Tonkotsu".into());
        fields.insert("price".into(), 13.5.into());
        fields.insert("imageUrl".into(), "".into());
        store.set(MENU, "ramen", fields).await.unwrap();

        let menu = MenuService::new(store).list().await.unwrap();
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].id.as_str(), "ramen");
    }
}
