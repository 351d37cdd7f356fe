use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod error;
mod handlers;
mod range;
mod routes;
mod state;

use fileserver_core::{Config, UploadTracker};
use fileserver_db::Database;
use fileserver_storage::FileStore;
use fileserver_video::VideoProcessor;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fileserver_api=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    // Load layered configuration
    let config = Arc::new(Config::load()?);
    tracing::info!("Configuration loaded, storage root: {:?}", config.storage.root);

    // Initialize database
    let db = Database::new(&config.database.url, config.database.max_connections).await?;
    db.init_schema().await?;
    let db = Arc::new(db);

    // Initialize file store
    let store = FileStore::new(config.storage.root.clone(), config.storage.temp_dir.clone());
    store.init().await?;
    let store = Arc::new(store);

    // Initialize video processor
    let video = Arc::new(VideoProcessor::new(config.video.thumbnail_size.clone()));

    // Restore persisted upload sessions so interrupted uploads can resume
    let tracker = UploadTracker::new();
    let restored = db.load_active_sessions().await?;
    if !restored.is_empty() {
        tracing::info!("Restoring {} active upload sessions", restored.len());
        for session in restored {
            tracker.insert(session).await;
        }
    }

    // Create app state
    let state = state::ApiState {
        config: config.clone(),
        db,
        store,
        tracker,
        video,
    };

    spawn_session_sweeper(state.clone());

    // Build router
    let app = routes::create_router(state);

    // Start server
    let addr = config.server_address();
    tracing::info!("File server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Hourly sweep of upload sessions past their TTL: drop them from the
/// tracker, mark them in the database and clear their chunk directories.
fn spawn_session_sweeper(state: state::ApiState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;

            for id in state.tracker.evict_expired().await {
                if let Err(e) = state.db.set_session_status(&id, "Expired").await {
                    tracing::error!("Failed to mark session {} expired: {}", id, e);
                }
                if let Err(e) = state.store.remove_session_dir(&id).await {
                    tracing::error!("Failed to remove chunks of session {}: {}", id, e);
                }
            }
        }
    });
}
