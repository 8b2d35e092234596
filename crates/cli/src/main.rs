//! Food ordering CLI - database migrations and seeding.
//!
//! # Usage
//!
//! ```bash
//! # Create the document store schema
//! food-order-cli migrate
//!
//! # Upsert the default menu into the `menu` collection
//! food-order-cli seed menu
//! ```
//!
//! Both commands read `FOOD_ORDER_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "food-order-cli")]
#[command(author, version, about = "Food ordering backend CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed collections with default data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert the default menu items (safe to re-run)
    Menu,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Menu => commands::seed::menu().await?,
        },
    }
    Ok(())
}
