use crate::{
    models::{AggregateStats, FileRecord, UploadChunkRecord, UploadSessionRecord},
    Error, Result,
};
use fileserver_core::{FileEntry, UploadSession, VideoMeta};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create new database connection. SQLite's `rwc` mode creates the
    /// database file but not missing directories, so the file's parent
    /// directory is created before connecting.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        if let Some(parent) = database_file_path(database_url)
            .as_deref()
            .and_then(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Connection(format!("cannot create {:?}: {}", parent, e))
            })?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Initialize database schema
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                size INTEGER NOT NULL,
                mime_type TEXT NOT NULL,
                sha256 TEXT NOT NULL,
                storage_path TEXT NOT NULL,
                kind TEXT NOT NULL,
                status TEXT NOT NULL,
                uploaded_at TEXT NOT NULL,
                duration_secs INTEGER,
                width INTEGER,
                height INTEGER,
                thumbnail_path TEXT,
                download_count INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS upload_sessions (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                total_size INTEGER NOT NULL,
                chunk_size INTEGER NOT NULL,
                total_chunks INTEGER NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS upload_chunks (
                upload_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                size INTEGER NOT NULL,
                PRIMARY KEY (upload_id, chunk_index),
                FOREIGN KEY (upload_id) REFERENCES upload_sessions(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Create indexes
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_status ON files(status)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_files_uploaded_at ON files(uploaded_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ========================================================================
    // File Operations
    // ========================================================================

    /// Save a file entry (insert or update on conflict)
    pub async fn save_file(&self, entry: &FileEntry) -> Result<()> {
        let (duration, width, height, thumbnail) = match &entry.video {
            Some(v) => (
                Some(v.duration_secs),
                Some(v.width),
                Some(v.height),
                v.thumbnail_path.clone(),
            ),
            None => (None, None, None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO files (
                id, filename, size, mime_type, sha256, storage_path,
                kind, status, uploaded_at, duration_secs, width, height,
                thumbnail_path, download_count
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                kind = excluded.kind,
                status = excluded.status,
                duration_secs = excluded.duration_secs,
                width = excluded.width,
                height = excluded.height,
                thumbnail_path = excluded.thumbnail_path
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.filename)
        .bind(entry.size)
        .bind(&entry.mime_type)
        .bind(&entry.sha256)
        .bind(&entry.storage_path)
        .bind(format!("{:?}", entry.kind))
        .bind(format!("{:?}", entry.status))
        .bind(entry.uploaded_at)
        .bind(duration)
        .bind(width)
        .bind(height)
        .bind(thumbnail)
        .bind(entry.download_count)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get file by ID
    pub async fn get_file(&self, file_id: &str) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = ?")
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// List recent files, optionally filtered by a filename substring
    pub async fn list_files(
        &self,
        limit: i64,
        offset: i64,
        query: Option<&str>,
    ) -> Result<Vec<FileRecord>> {
        let records = match query {
            Some(q) => {
                let pattern = format!("%{}%", q);
                sqlx::query_as::<_, FileRecord>(
                    r#"
                    SELECT * FROM files
                    WHERE filename LIKE ?
                    ORDER BY uploaded_at DESC LIMIT ? OFFSET ?
                    "#,
                )
                .bind(pattern)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, FileRecord>(
                    "SELECT * FROM files ORDER BY uploaded_at DESC LIMIT ? OFFSET ?",
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(records)
    }

    /// Attach probed video metadata to a file
    pub async fn set_video_meta(&self, file_id: &str, meta: &VideoMeta) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE files SET
                kind = 'Video',
                duration_secs = ?,
                width = ?,
                height = ?,
                thumbnail_path = ?
            WHERE id = ?
            "#,
        )
        .bind(meta.duration_secs)
        .bind(meta.width)
        .bind(meta.height)
        .bind(&meta.thumbnail_path)
        .bind(file_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Increment the download counter
    pub async fn bump_download_count(&self, file_id: &str) -> Result<()> {
        sqlx::query("UPDATE files SET download_count = download_count + 1 WHERE id = ?")
            .bind(file_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a file row. Unknown ids are an error so the API can 404.
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(file_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::FileNotFound(file_id.to_string()));
        }

        Ok(())
    }

    // ========================================================================
    // Upload Session Operations
    // ========================================================================

    /// Save upload session
    pub async fn save_session(&self, session: &UploadSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO upload_sessions (
                id, filename, total_size, chunk_size, total_chunks,
                status, created_at, expires_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                status = excluded.status
            "#,
        )
        .bind(&session.id)
        .bind(&session.filename)
        .bind(session.total_size)
        .bind(session.chunk_size)
        .bind(session.total_chunks)
        .bind(format!("{:?}", session.status))
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get upload session by ID
    pub async fn get_session(&self, session_id: &str) -> Result<Option<UploadSessionRecord>> {
        let record = sqlx::query_as::<_, UploadSessionRecord>(
            "SELECT * FROM upload_sessions WHERE id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// All sessions still marked Active, with their received chunk sets
    /// rebuilt. Used to repopulate the tracker on startup.
    pub async fn load_active_sessions(&self) -> Result<Vec<UploadSession>> {
        let records = sqlx::query_as::<_, UploadSessionRecord>(
            "SELECT * FROM upload_sessions WHERE status = 'Active'",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut sessions = Vec::with_capacity(records.len());
        for record in records {
            let chunks = self.get_session_chunks(&record.id).await?;
            let received: BTreeSet<i64> = chunks.iter().map(|c| c.chunk_index).collect();

            sessions.push(UploadSession {
                id: record.id,
                filename: record.filename,
                total_size: record.total_size,
                chunk_size: record.chunk_size,
                total_chunks: record.total_chunks,
                received,
                status: fileserver_core::UploadStatus::Active,
                created_at: record.created_at,
                expires_at: record.expires_at,
            });
        }

        Ok(sessions)
    }

    /// Sessions whose TTL has passed
    pub async fn expired_sessions(&self) -> Result<Vec<UploadSessionRecord>> {
        let now = chrono::Utc::now();
        let records = sqlx::query_as::<_, UploadSessionRecord>(
            "SELECT * FROM upload_sessions WHERE status = 'Active' AND expires_at < ?",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Update session status
    pub async fn set_session_status(&self, session_id: &str, status: &str) -> Result<()> {
        sqlx::query("UPDATE upload_sessions SET status = ? WHERE id = ?")
            .bind(status)
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete session and its chunk rows
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM upload_chunks WHERE upload_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        sqlx::query("DELETE FROM upload_sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ========================================================================
    // Chunk Operations
    // ========================================================================

    /// Record a received chunk. Re-inserting the same index is a no-op.
    pub async fn save_chunk(&self, session_id: &str, index: i64, size: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO upload_chunks (upload_id, chunk_index, size)
            VALUES (?, ?, ?)
            ON CONFLICT (upload_id, chunk_index) DO NOTHING
            "#,
        )
        .bind(session_id)
        .bind(index)
        .bind(size)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a session's received chunks, ordered by index
    pub async fn get_session_chunks(&self, session_id: &str) -> Result<Vec<UploadChunkRecord>> {
        let records = sqlx::query_as::<_, UploadChunkRecord>(
            "SELECT * FROM upload_chunks WHERE upload_id = ? ORDER BY chunk_index",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    /// Get aggregate statistics
    pub async fn get_aggregate_stats(&self) -> Result<AggregateStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as total_files,
                SUM(size) as total_bytes,
                COUNT(CASE WHEN kind = 'Video' THEN 1 END) as video_files,
                SUM(download_count) as total_downloads
            FROM files
            WHERE status = 'Available'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let sessions = sqlx::query(
            "SELECT COUNT(*) as active FROM upload_sessions WHERE status = 'Active'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AggregateStats {
            total_files: row.get("total_files"),
            total_bytes: row.get("total_bytes"),
            video_files: row.get("video_files"),
            total_downloads: row.get("total_downloads"),
            active_upload_sessions: sessions.get("active"),
        })
    }
}

/// Filesystem path of a `sqlite:` URL, if it names a file at all.
fn database_file_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);

    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_file_path() {
        assert_eq!(
            database_file_path("sqlite://data/fileserver.db?mode=rwc"),
            Some(PathBuf::from("data/fileserver.db"))
        );
        assert_eq!(
            database_file_path("sqlite:files.db"),
            Some(PathBuf::from("files.db"))
        );
        assert_eq!(database_file_path("sqlite::memory:"), None);
        assert_eq!(database_file_path("sqlite://:memory:"), None);
        assert_eq!(database_file_path("postgres://localhost/x"), None);
    }
}
