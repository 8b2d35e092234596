//! Database migration command.
//!
//! Migrations live in `crates/server/migrations/` and are embedded in the
//! server crate, so the CLI and the server always agree on the schema. The
//! server never migrates on startup.

use food_order_server::db::{MIGRATOR, create_pool};
use tracing::info;

use super::{CommandError, database_url};

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    info!("Running migrations...");
    MIGRATOR.run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
