use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "fileserver-api"
    }))
}

pub async fn server_info() -> impl IntoResponse {
    Json(json!({
        "name": "Internal File Server",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Intranet file sharing with large-file storage and in-browser video playback",
        "features": [
            "large file upload/download",
            "resumable chunked uploads",
            "range requests",
            "video streaming and thumbnails"
        ]
    }))
}
