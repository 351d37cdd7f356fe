use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::video;
use crate::state::ApiState;
use fileserver_core::{sanitize_filename, Error as CoreError, FileEntry};
use fileserver_db::FileRecord;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Serialize, Deserialize)]
pub struct FileResponse {
    pub id: String,
    pub filename: String,
    pub size: i64,
    pub mime_type: String,
    pub sha256: String,
    pub kind: String,
    pub status: String,
    pub uploaded_at: String,
    pub download_count: i64,
    pub video: Option<VideoInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoInfo {
    pub duration_secs: i64,
    pub width: i64,
    pub height: i64,
    pub has_thumbnail: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Filename substring filter
    pub q: Option<String>,
}

/// Single-shot multipart upload: the whole file in one `file` field.
pub async fn upload_file(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<Json<FileResponse>, ApiError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = sanitize_filename(field.file_name().unwrap_or_default())?;
        let file_id = Uuid::new_v4().to_string();
        let limit = state.config.storage.max_file_size;

        let mut writer = state.store.begin_whole(&file_id).await?;
        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    writer.abort().await?;
                    return Err(ApiError::bad_request(format!("upload aborted: {}", e)));
                }
            };

            if writer.written() + chunk.len() as i64 > limit {
                let size = writer.written() + chunk.len() as i64;
                writer.abort().await?;
                return Err(CoreError::FileTooLarge { size, limit }
                .into());
            }
            writer.write(&chunk).await?;
        }

        let blob = writer.finish().await?;
        let entry = FileEntry::new(filename, blob.size, blob.rel_path, blob.sha256)
            .with_id(file_id.clone());

        state.db.save_file(&entry).await?;
        tracing::info!(
            "Stored file {} ({}, {} bytes)",
            entry.filename,
            entry.id,
            entry.size
        );

        video::spawn_processing(&state, &entry);

        let record = state
            .db
            .get_file(&file_id)
            .await?
            .ok_or_else(|| ApiError::internal("file vanished after insert"))?;
        return Ok(Json(record_to_response(&record)));
    }

    Err(ApiError::bad_request("multipart body has no `file` field"))
}

/// List recent files
pub async fn list_files(
    State(state): State<ApiState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<FileResponse>>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let records = state
        .db
        .list_files(limit, offset, params.q.as_deref())
        .await?;

    Ok(Json(records.iter().map(record_to_response).collect()))
}

/// Get file metadata
pub async fn get_file(
    State(state): State<ApiState>,
    Path(file_id): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    match state.db.get_file(&file_id).await? {
        Some(record) => Ok(Json(record_to_response(&record))),
        None => Err(ApiError::not_found(format!("file not found: {}", file_id))),
    }
}

/// Delete a file: metadata row, blob, and thumbnail if present.
pub async fn delete_file(
    State(state): State<ApiState>,
    Path(file_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = state
        .db
        .get_file(&file_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("file not found: {}", file_id)))?;

    state.db.delete_file(&file_id).await?;
    state.store.remove(&record.storage_path).await?;
    if let Some(thumb) = &record.thumbnail_path {
        state.store.remove(thumb).await?;
    }

    tracing::info!("Deleted file {} ({})", record.filename, file_id);

    Ok(Json(serde_json::json!({ "deleted": file_id })))
}

pub fn record_to_response(record: &FileRecord) -> FileResponse {
    let video = record.duration_secs.map(|duration_secs| VideoInfo {
        duration_secs,
        width: record.width.unwrap_or(0),
        height: record.height.unwrap_or(0),
        has_thumbnail: record.thumbnail_path.is_some(),
    });

    FileResponse {
        id: record.id.clone(),
        filename: record.filename.clone(),
        size: record.size,
        mime_type: record.mime_type.clone(),
        sha256: record.sha256.clone(),
        kind: record.kind.clone(),
        status: record.status.clone(),
        uploaded_at: record.uploaded_at.to_rfc3339(),
        download_count: record.download_count,
        video,
    }
}
