use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_FILENAME_BYTES: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    Regular,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Uploading,
    Available,
    Failed,
}

/// Video stream metadata filled in after probing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMeta {
    pub duration_secs: i64,
    pub width: i64,
    pub height: i64,
    pub thumbnail_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: String,
    pub filename: String,
    pub size: i64,
    pub mime_type: String,
    pub sha256: String,
    /// Path relative to the storage root.
    pub storage_path: String,
    pub kind: FileKind,
    pub status: FileStatus,
    pub uploaded_at: DateTime<Utc>,
    pub video: Option<VideoMeta>,
    pub download_count: i64,
}

impl FileEntry {
    pub fn new(filename: String, size: i64, storage_path: String, sha256: String) -> Self {
        let mime_type = mime_for_filename(&filename).to_string();
        Self {
            id: Uuid::new_v4().to_string(),
            filename,
            size,
            mime_type,
            sha256,
            storage_path,
            kind: FileKind::Regular,
            status: FileStatus::Available,
            uploaded_at: Utc::now(),
            video: None,
            download_count: 0,
        }
    }

    /// Pin the entry to a pre-allocated id (the id decides the sharded
    /// storage path, so it exists before the metadata row does).
    pub fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }

    pub fn extension(&self) -> Option<&str> {
        self.filename.rsplit_once('.').map(|(_, ext)| ext)
    }

    pub fn mark_video(&mut self, meta: VideoMeta) {
        self.kind = FileKind::Video;
        self.video = Some(meta);
    }
}

/// Validate a client-supplied filename and strip nothing: a name either
/// passes as-is or is rejected. Path separators and `..` components would
/// let an upload escape the storage root.
pub fn sanitize_filename(name: &str) -> Result<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::InvalidFilename("empty filename".into()));
    }
    if name.len() > MAX_FILENAME_BYTES {
        return Err(Error::InvalidFilename(format!(
            "filename exceeds {} bytes",
            MAX_FILENAME_BYTES
        )));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidFilename(format!(
            "filename contains path separator: {}",
            name
        )));
    }
    if name == "." || name == ".." {
        return Err(Error::InvalidFilename(format!(
            "filename is a path component: {}",
            name
        )));
    }
    if name.contains('\0') {
        return Err(Error::InvalidFilename("filename contains NUL".into()));
    }

    Ok(name.to_string())
}

/// Content type from the filename extension. Unknown extensions fall back
/// to application/octet-stream.
pub fn mime_for_filename(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "txt" | "log" | "md" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        "tar" => "application/x-tar",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}
