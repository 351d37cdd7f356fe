use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;

use cli::Cli;
use fileserver_core::Config;
use fileserver_db::Database;
use fileserver_storage::FileStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fileserver=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Same layered configuration as the server
    let mut config = Config::load()?;
    if let Some(url) = &cli.database_url {
        config.database.url = url.clone();
    }

    let db = Database::new(&config.database.url, config.database.max_connections).await?;
    let store = FileStore::new(config.storage.root.clone(), config.storage.temp_dir.clone());

    commands::execute(cli.command, db, store).await
}
