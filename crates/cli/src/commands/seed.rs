//! Seed the `menu` collection with the default menu.
//!
//! Items are upserted by id, so running the command twice leaves the same
//! six documents in place.

use std::sync::Arc;

use food_order_server::db::{PgDocumentStore, create_pool};
use food_order_server::services::menu::MenuService;
use tracing::info;

use super::{CommandError, database_url};

/// Upsert the default menu items.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or the batch write fails.
pub async fn menu() -> Result<(), CommandError> {
    let database_url = database_url()?;

    let pool = create_pool(&database_url).await?;
    info!("Connected to database");

    // Seeding is a single batch write and never retries a transaction
    let store = Arc::new(PgDocumentStore::new(pool, 1));
    let items = MenuService::new(store).seed().await?;

    info!("Seeding complete!");
    for item in &items {
        info!("  {} ({}): {}", item.name, item.id, item.price);
    }

    Ok(())
}
