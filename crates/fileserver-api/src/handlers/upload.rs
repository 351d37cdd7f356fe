use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::files::{record_to_response, FileResponse};
use crate::handlers::video;
use crate::state::ApiState;
use fileserver_core::{sanitize_filename, Error as CoreError, FileEntry, UploadSession};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUploadRequest {
    pub filename: String,
    pub total_size: i64,
    /// Defaults to the server's configured chunk size.
    pub chunk_size: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadSessionResponse {
    pub id: String,
    pub filename: String,
    pub total_size: i64,
    pub chunk_size: i64,
    pub total_chunks: i64,
    pub received_chunks: i64,
    pub missing_chunks: Vec<i64>,
    pub status: String,
    pub expires_at: String,
}

/// Open a resumable upload session.
pub async fn create_upload(
    State(state): State<ApiState>,
    Json(payload): Json<CreateUploadRequest>,
) -> Result<Json<UploadSessionResponse>, ApiError> {
    let filename = sanitize_filename(&payload.filename)?;

    let limit = state.config.storage.max_file_size;
    if payload.total_size > limit {
        return Err(CoreError::FileTooLarge {
            size: payload.total_size,
            limit,
        }
        .into());
    }

    let chunk_size = payload
        .chunk_size
        .unwrap_or(state.config.storage.chunk_size);
    let session = UploadSession::new(
        filename,
        payload.total_size,
        chunk_size,
        state.config.storage.session_ttl_hours,
    )?;

    state.db.save_session(&session).await?;
    state.tracker.insert(session.clone()).await;

    Ok(Json(session_to_response(&session)))
}

/// Session status, including which chunks are still missing. A client
/// resuming after an interruption starts here.
pub async fn get_upload(
    State(state): State<ApiState>,
    Path(upload_id): Path<String>,
) -> Result<Json<UploadSessionResponse>, ApiError> {
    let session = state
        .tracker
        .get(&upload_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("upload session not found: {}", upload_id)))?;

    Ok(Json(session_to_response(&session)))
}

/// Receive one chunk as the raw request body.
pub async fn put_chunk(
    State(state): State<ApiState>,
    Path((upload_id, index)): Path<(String, i64)>,
    body: Bytes,
) -> Result<Json<UploadSessionResponse>, ApiError> {
    let session = state
        .tracker
        .get(&upload_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("upload session not found: {}", upload_id)))?;

    // Expiry is checked before touching the disk so an expired session
    // never leaves a stray chunk behind.
    if session.is_expired(chrono::Utc::now()) {
        return Err(CoreError::SessionExpired(upload_id).into());
    }

    let expected = session.expected_chunk_len(index)?;
    if body.len() as i64 != expected {
        return Err(ApiError::bad_request(format!(
            "chunk {} must be {} bytes, got {}",
            index,
            expected,
            body.len()
        )));
    }

    state.store.write_chunk(&upload_id, index, &body).await?;
    let session = state.tracker.record_chunk(&upload_id, index).await?;
    state.db.save_chunk(&upload_id, index, expected).await?;

    Ok(Json(session_to_response(&session)))
}

/// Assemble a finished session into a stored file.
pub async fn complete_upload(
    State(state): State<ApiState>,
    Path(upload_id): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    let session = state
        .tracker
        .get(&upload_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("upload session not found: {}", upload_id)))?;

    if !session.is_complete() {
        let missing = session.missing_chunks();
        return Err(ApiError::bad_request(format!(
            "upload incomplete: {} of {} chunks missing (first missing: {})",
            missing.len(),
            session.total_chunks,
            missing[0]
        )));
    }

    let file_id = Uuid::new_v4().to_string();
    let blob = state
        .store
        .assemble(
            &upload_id,
            session.total_chunks,
            session.total_size,
            &file_id,
        )
        .await?;

    let entry = FileEntry::new(
        session.filename.clone(),
        blob.size,
        blob.rel_path,
        blob.sha256,
    )
    .with_id(file_id.clone());

    state.db.save_file(&entry).await?;
    state.db.delete_session(&upload_id).await?;
    state.tracker.remove(&upload_id).await;
    state.store.remove_session_dir(&upload_id).await?;

    tracing::info!(
        "Completed upload {} -> file {} ({}, {} bytes)",
        upload_id,
        file_id,
        entry.filename,
        entry.size
    );

    video::spawn_processing(&state, &entry);

    let record = state
        .db
        .get_file(&file_id)
        .await?
        .ok_or_else(|| ApiError::internal("file vanished after insert"))?;
    Ok(Json(record_to_response(&record)))
}

/// Abort a session and discard its chunks.
pub async fn abort_upload(
    State(state): State<ApiState>,
    Path(upload_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let known_to_db = state.db.get_session(&upload_id).await?.is_some();
    let known_to_tracker = state.tracker.remove(&upload_id).await.is_some();
    if !known_to_db && !known_to_tracker {
        return Err(ApiError::not_found(format!(
            "upload session not found: {}",
            upload_id
        )));
    }

    state.db.delete_session(&upload_id).await?;
    state.store.remove_session_dir(&upload_id).await?;

    tracing::info!("Aborted upload session: {}", upload_id);

    Ok(Json(serde_json::json!({ "aborted": upload_id })))
}

fn session_to_response(session: &UploadSession) -> UploadSessionResponse {
    UploadSessionResponse {
        id: session.id.clone(),
        filename: session.filename.clone(),
        total_size: session.total_size,
        chunk_size: session.chunk_size,
        total_chunks: session.total_chunks,
        received_chunks: session.received.len() as i64,
        missing_chunks: session.missing_chunks(),
        status: format!("{:?}", session.status),
        expires_at: session.expires_at.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fileserver_core::{Config, UploadTracker};
    use fileserver_db::Database;
    use fileserver_storage::FileStore;
    use fileserver_video::VideoProcessor;
    use std::sync::Arc;

    async fn test_state(dir: &std::path::Path) -> ApiState {
        let db = Database::new("sqlite::memory:", 1).await.unwrap();
        db.init_schema().await.unwrap();
        let store = FileStore::new(dir.join("files"), dir.join("tmp"));
        store.init().await.unwrap();

        ApiState {
            config: Arc::new(Config::default()),
            db: Arc::new(db),
            store: Arc::new(store),
            tracker: UploadTracker::new(),
            video: Arc::new(VideoProcessor::new("320x180".to_string())),
        }
    }

    #[tokio::test]
    async fn test_put_chunk_rejects_wrong_size() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;

        let session = UploadSession::new("big.bin".to_string(), 20, 10, 24).unwrap();
        let id = session.id.clone();
        state.tracker.insert(session).await;

        let result = put_chunk(
            State(state.clone()),
            Path((id.clone(), 0)),
            Bytes::from(vec![0u8; 7]),
        )
        .await;

        assert!(result.is_err());
        assert!(!state.store.session_dir(&id).exists());
    }

    #[tokio::test]
    async fn test_put_chunk_on_expired_session_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;

        let mut session = UploadSession::new("big.bin".to_string(), 20, 10, 24).unwrap();
        session.expires_at = chrono::Utc::now() - chrono::Duration::hours(1);
        let id = session.id.clone();
        state.tracker.insert(session).await;

        let result = put_chunk(
            State(state.clone()),
            Path((id.clone(), 0)),
            Bytes::from(vec![0u8; 10]),
        )
        .await;

        assert!(result.is_err());
        assert!(!state.store.session_dir(&id).exists());
    }
}
