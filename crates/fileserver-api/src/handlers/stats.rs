use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::ApiState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub storage: StorageStats,
    pub uploads: UploadStats,
}

#[derive(Debug, Serialize)]
pub struct StorageStats {
    pub total_files: i64,
    pub total_bytes: i64,
    pub video_files: i64,
    pub total_downloads: i64,
}

#[derive(Debug, Serialize)]
pub struct UploadStats {
    pub active_sessions: i64,
    pub tracked_in_memory: usize,
}

pub async fn get_statistics(
    State(state): State<ApiState>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.db.get_aggregate_stats().await?;
    let tracked = state.tracker.active_count().await;

    Ok(Json(StatsResponse {
        storage: StorageStats {
            total_files: stats.total_files,
            total_bytes: stats.total_bytes.unwrap_or(0),
            video_files: stats.video_files,
            total_downloads: stats.total_downloads.unwrap_or(0),
        },
        uploads: UploadStats {
            active_sessions: stats.active_upload_sessions,
            tracked_in_memory: tracked,
        },
    }))
}
