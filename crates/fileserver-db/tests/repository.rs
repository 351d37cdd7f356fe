use fileserver_core::{FileEntry, UploadSession, VideoMeta};
use fileserver_db::Database;

// In-memory SQLite gives each connection its own database, so the pool is
// pinned to a single connection.
async fn test_db() -> Database {
    let db = Database::new("sqlite::memory:", 1).await.unwrap();
    db.init_schema().await.unwrap();
    db
}

fn entry(name: &str, size: i64) -> FileEntry {
    FileEntry::new(
        name.to_string(),
        size,
        format!("ab/cd/{}", name),
        "0".repeat(64),
    )
}

#[tokio::test]
async fn test_save_and_get_file() {
    let db = test_db().await;
    let e = entry("report.pdf", 2048);

    db.save_file(&e).await.unwrap();

    let record = db.get_file(&e.id).await.unwrap().unwrap();
    assert_eq!(record.filename, "report.pdf");
    assert_eq!(record.size, 2048);
    assert_eq!(record.mime_type, "application/pdf");
    assert_eq!(record.status, "Available");
    assert!(!record.is_video());
}

#[tokio::test]
async fn test_get_unknown_file_is_none() {
    let db = test_db().await;
    assert!(db.get_file("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_files_search_and_pagination() {
    let db = test_db().await;
    for name in ["alpha.txt", "beta.txt", "alpha.mp4"] {
        db.save_file(&entry(name, 1)).await.unwrap();
    }

    let all = db.list_files(10, 0, None).await.unwrap();
    assert_eq!(all.len(), 3);

    let alphas = db.list_files(10, 0, Some("alpha")).await.unwrap();
    assert_eq!(alphas.len(), 2);

    let page = db.list_files(2, 2, None).await.unwrap();
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn test_video_meta_roundtrip() {
    let db = test_db().await;
    let e = entry("clip.mp4", 1 << 20);
    db.save_file(&e).await.unwrap();

    let meta = VideoMeta {
        duration_secs: 90,
        width: 1280,
        height: 720,
        thumbnail_path: Some("ab/cd/clip.jpg".to_string()),
    };
    db.set_video_meta(&e.id, &meta).await.unwrap();

    let record = db.get_file(&e.id).await.unwrap().unwrap();
    assert!(record.is_video());
    assert_eq!(record.duration_secs, Some(90));
    assert_eq!(record.width, Some(1280));
    assert_eq!(record.thumbnail_path.as_deref(), Some("ab/cd/clip.jpg"));
}

#[tokio::test]
async fn test_download_counter() {
    let db = test_db().await;
    let e = entry("a.bin", 5);
    db.save_file(&e).await.unwrap();

    db.bump_download_count(&e.id).await.unwrap();
    db.bump_download_count(&e.id).await.unwrap();

    let record = db.get_file(&e.id).await.unwrap().unwrap();
    assert_eq!(record.download_count, 2);
}

#[tokio::test]
async fn test_delete_file() {
    let db = test_db().await;
    let e = entry("gone.bin", 1);
    db.save_file(&e).await.unwrap();

    db.delete_file(&e.id).await.unwrap();
    assert!(db.get_file(&e.id).await.unwrap().is_none());

    // Second delete reports not-found
    assert!(db.delete_file(&e.id).await.is_err());
}

#[tokio::test]
async fn test_session_chunks_and_restore() {
    let db = test_db().await;
    let session = UploadSession::new("big.iso".to_string(), 25, 10, 24).unwrap();
    db.save_session(&session).await.unwrap();

    db.save_chunk(&session.id, 0, 10).await.unwrap();
    db.save_chunk(&session.id, 2, 5).await.unwrap();
    // Duplicate insert is a no-op
    db.save_chunk(&session.id, 0, 10).await.unwrap();

    let chunks = db.get_session_chunks(&session.id).await.unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].chunk_index, 0);
    assert_eq!(chunks[1].chunk_index, 2);

    let restored = db.load_active_sessions().await.unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].missing_chunks(), vec![1]);
}

#[tokio::test]
async fn test_session_status_and_delete() {
    let db = test_db().await;
    let session = UploadSession::new("x.bin".to_string(), 10, 10, 24).unwrap();
    db.save_session(&session).await.unwrap();

    db.set_session_status(&session.id, "Complete").await.unwrap();
    let record = db.get_session(&session.id).await.unwrap().unwrap();
    assert_eq!(record.status, "Complete");

    // Completed sessions are not restored
    assert!(db.load_active_sessions().await.unwrap().is_empty());

    db.delete_session(&session.id).await.unwrap();
    assert!(db.get_session(&session.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_aggregate_stats() {
    let db = test_db().await;

    let mut video = entry("v.mp4", 100);
    video.mark_video(VideoMeta {
        duration_secs: 10,
        width: 640,
        height: 480,
        thumbnail_path: None,
    });
    db.save_file(&video).await.unwrap();
    db.save_file(&entry("d.txt", 50)).await.unwrap();

    let session = UploadSession::new("s.bin".to_string(), 10, 10, 24).unwrap();
    db.save_session(&session).await.unwrap();

    let stats = db.get_aggregate_stats().await.unwrap();
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.total_bytes, Some(150));
    assert_eq!(stats.video_files, 1);
    assert_eq!(stats.active_upload_sessions, 1);
}

#[tokio::test]
async fn test_connect_creates_missing_parent_dir() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data").join("fileserver.db");
    assert!(!db_path.parent().unwrap().exists());

    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    let db = Database::new(&url, 1).await.unwrap();
    db.init_schema().await.unwrap();

    assert!(db_path.exists());
}
