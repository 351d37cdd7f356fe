use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};

use crate::error::ApiError;
use crate::handlers::download::{serve_blob, Disposition};
use crate::state::ApiState;
use fileserver_core::FileEntry;

/// Inline range-aware streaming for the in-browser video player.
pub async fn stream(
    State(state): State<ApiState>,
    Path(file_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve_blob(&state, &file_id, &headers, Disposition::Inline).await
}

/// Thumbnail jpeg for a processed video, 404 otherwise.
pub async fn thumbnail(
    State(state): State<ApiState>,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    let record = state
        .db
        .get_file(&file_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("file not found: {}", file_id)))?;

    let thumb_rel = record
        .thumbnail_path
        .ok_or_else(|| ApiError::not_found(format!("no thumbnail for: {}", file_id)))?;

    let bytes = tokio::fs::read(state.store.abs_path(&thumb_rel))
        .await
        .map_err(|e| ApiError::not_found(format!("thumbnail unreadable: {}", e)))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(header::CONTENT_LENGTH, bytes.len())
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(format!("response build failed: {}", e)))
}

/// Kick off background probing for a freshly stored file when its extension
/// looks like video. Probe failure is non-fatal: the file simply stays a
/// regular download.
pub fn spawn_processing(state: &ApiState, entry: &FileEntry) {
    let ext = match entry.extension() {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return,
    };
    if !state.config.video.extensions.contains(&ext) {
        return;
    }

    let state = state.clone();
    let file_id = entry.id.clone();
    let rel_path = entry.storage_path.clone();

    tokio::spawn(async move {
        let input = state.store.abs_path(&rel_path);

        let probe = match state.video.probe(&input).await {
            Ok(probe) => probe,
            Err(e) => {
                tracing::warn!(
                    "Video probe failed for {}, leaving it as a regular file: {}",
                    file_id,
                    e
                );
                return;
            }
        };

        let thumb_rel = format!("{}.jpg", rel_path);
        let thumb = match state
            .video
            .thumbnail(&input, &state.store.abs_path(&thumb_rel))
            .await
        {
            Ok(()) => Some(thumb_rel),
            Err(e) => {
                tracing::warn!("Thumbnail generation failed for {}: {}", file_id, e);
                None
            }
        };

        let meta = probe.into_meta(thumb);
        if let Err(e) = state.db.set_video_meta(&file_id, &meta).await {
            tracing::error!("Failed to save video metadata for {}: {}", file_id, e);
            return;
        }

        tracing::info!(
            "Processed video {}: {}s {}x{}",
            file_id,
            meta.duration_secs,
            meta.width,
            meta.height
        );
    });
}
