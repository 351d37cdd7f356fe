use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileRecord {
    pub id: String,
    pub filename: String,
    pub size: i64,
    pub mime_type: String,
    pub sha256: String,
    pub storage_path: String,
    pub kind: String,
    pub status: String,
    pub uploaded_at: DateTime<Utc>,
    pub duration_secs: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub thumbnail_path: Option<String>,
    pub download_count: i64,
}

impl FileRecord {
    pub fn is_video(&self) -> bool {
        self.kind == "Video"
    }

    pub fn is_available(&self) -> bool {
        self.status == "Available"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UploadSessionRecord {
    pub id: String,
    pub filename: String,
    pub total_size: i64,
    pub chunk_size: i64,
    pub total_chunks: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UploadChunkRecord {
    pub upload_id: String,
    pub chunk_index: i64,
    pub size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_files: i64,
    pub total_bytes: Option<i64>,
    pub video_files: i64,
    pub total_downloads: Option<i64>,
    pub active_upload_sessions: i64,
}
