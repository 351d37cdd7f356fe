use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{handlers, state::ApiState};

pub fn create_router(state: ApiState) -> Router {
    // The multipart endpoint accepts whole files in one request.
    let body_limit = state.config.storage.max_file_size as usize;

    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        .route("/api/info", get(handlers::health::server_info))

        // File endpoints
        .route("/api/files", post(handlers::files::upload_file))
        .route("/api/files", get(handlers::files::list_files))
        .route("/api/files/:file_id", get(handlers::files::get_file))
        .route("/api/files/:file_id", axum::routing::delete(handlers::files::delete_file))
        .route("/api/files/:file_id/download", get(handlers::download::download))
        .route("/api/files/:file_id/stream", get(handlers::video::stream))
        .route("/api/files/:file_id/thumbnail", get(handlers::video::thumbnail))

        // Resumable upload endpoints
        .route("/api/uploads", post(handlers::upload::create_upload))
        .route("/api/uploads/:upload_id", get(handlers::upload::get_upload))
        .route("/api/uploads/:upload_id", axum::routing::delete(handlers::upload::abort_upload))
        .route("/api/uploads/:upload_id/chunks/:index", put(handlers::upload::put_chunk))
        .route("/api/uploads/:upload_id/complete", post(handlers::upload::complete_upload))

        // Statistics
        .route("/api/stats", get(handlers::stats::get_statistics))

        // Static frontend
        .fallback_service(ServeDir::new("static"))

        // Add state
        .with_state(state)

        // Layers
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
