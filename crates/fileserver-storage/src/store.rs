use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const COPY_BUF_SIZE: usize = 64 * 1024;

/// A fully written blob: its path relative to the storage root, its size
/// and its sha256 hex digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub rel_path: String,
    pub size: i64,
    pub sha256: String,
}

/// On-disk file store. Final blobs live under a two-level sharded layout
/// (`root/ab/cd/<id>`) so directory fan-out stays bounded; in-flight chunk
/// uploads live under `temp_dir/<upload_id>/`.
///
/// Everything under `root` is only ever created by atomic rename, so a
/// crash can leave debris only in the temp area.
#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
    temp_dir: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            temp_dir: temp_dir.into(),
        }
    }

    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        fs::create_dir_all(&self.temp_dir).await?;
        Ok(())
    }

    /// Sharded path for a blob id, relative to the root.
    pub fn shard_rel(id: &str) -> String {
        // Ids are uuids, always long enough to shard on.
        let a = &id[0..2.min(id.len())];
        let b = if id.len() >= 4 { &id[2..4] } else { "00" };
        format!("{}/{}/{}", a, b, id)
    }

    pub fn abs_path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn session_dir(&self, upload_id: &str) -> PathBuf {
        self.temp_dir.join(upload_id)
    }

    fn chunk_path(&self, upload_id: &str, index: i64) -> PathBuf {
        self.session_dir(upload_id).join(format!("{}.part", index))
    }

    // ========================================================================
    // Chunked uploads
    // ========================================================================

    /// Write one chunk: to a `.tmp` sibling first, fsync, then atomic
    /// rename, so a torn write never looks like a finished chunk.
    pub async fn write_chunk(&self, upload_id: &str, index: i64, data: &[u8]) -> Result<()> {
        let dir = self.session_dir(upload_id);
        fs::create_dir_all(&dir).await?;

        let final_path = self.chunk_path(upload_id, index);
        let tmp_path = final_path.with_extension("part.tmp");

        let mut file = File::create(&tmp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &final_path).await?;
        Ok(())
    }

    pub async fn chunk_len(&self, upload_id: &str, index: i64) -> Result<Option<i64>> {
        match fs::metadata(self.chunk_path(upload_id, index)).await {
            Ok(meta) => Ok(Some(meta.len() as i64)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Concatenate all chunks of an upload in index order into the final
    /// sharded location, hashing while copying. `declared_size` is what the
    /// client promised at session creation; a mismatch aborts and leaves
    /// nothing under the root.
    pub async fn assemble(
        &self,
        upload_id: &str,
        total_chunks: i64,
        declared_size: i64,
        blob_id: &str,
    ) -> Result<StoredBlob> {
        let spill_path = self.temp_dir.join(format!("{}.assembling", upload_id));
        let mut out = File::create(&spill_path).await?;
        let mut hasher = Sha256::new();
        let mut total: i64 = 0;
        let mut buf = vec![0u8; COPY_BUF_SIZE];

        for index in 0..total_chunks {
            let path = self.chunk_path(upload_id, index);
            let mut chunk = match File::open(&path).await {
                Ok(f) => f,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    drop(out);
                    let _ = fs::remove_file(&spill_path).await;
                    return Err(Error::ChunkMissing { index });
                }
                Err(e) => return Err(e.into()),
            };

            loop {
                let n = chunk.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
                out.write_all(&buf[..n]).await?;
                total += n as i64;
            }
        }

        out.sync_all().await?;
        drop(out);

        if total != declared_size {
            let _ = fs::remove_file(&spill_path).await;
            return Err(Error::SizeMismatch {
                expected: declared_size,
                actual: total,
            });
        }

        let rel = Self::shard_rel(blob_id);
        let final_path = self.abs_path(&rel);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(&spill_path, &final_path).await?;

        tracing::info!("Assembled upload {} into {} ({} bytes)", upload_id, rel, total);

        Ok(StoredBlob {
            rel_path: rel,
            size: total,
            sha256: format!("{:x}", hasher.finalize()),
        })
    }

    // ========================================================================
    // Single-shot uploads
    // ========================================================================

    /// Start writing a whole blob. The writer lands in the temp area and
    /// moves into the sharded layout only on `finish()`.
    pub async fn begin_whole(&self, blob_id: &str) -> Result<WholeFileWriter> {
        fs::create_dir_all(&self.temp_dir).await?;
        let spill_path = self.temp_dir.join(format!("{}.incoming", blob_id));
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&spill_path)
            .await?;

        Ok(WholeFileWriter {
            store: self.clone(),
            blob_id: blob_id.to_string(),
            spill_path,
            file,
            hasher: Sha256::new(),
            written: 0,
        })
    }

    // ========================================================================
    // Reads and removal
    // ========================================================================

    pub async fn open(&self, rel: &str) -> Result<File> {
        match File::open(self.abs_path(rel)).await {
            Ok(f) => Ok(f),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::BlobNotFound(rel.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove(&self, rel: &str) -> Result<()> {
        match fs::remove_file(self.abs_path(rel)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove_session_dir(&self, upload_id: &str) -> Result<()> {
        match fs::remove_dir_all(self.session_dir(upload_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Upload ids that still have a temp directory on disk. GC uses this to
    /// find debris left by sessions the database no longer knows about.
    pub async fn list_session_dirs(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut entries = match fs::read_dir(&self.temp_dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Ok(name) = entry.file_name().into_string() {
                    ids.push(name);
                }
            }
        }

        Ok(ids)
    }
}

/// Incremental writer for single-shot uploads.
pub struct WholeFileWriter {
    store: FileStore,
    blob_id: String,
    spill_path: PathBuf,
    file: File,
    hasher: Sha256,
    written: i64,
}

impl WholeFileWriter {
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.file.write_all(data).await?;
        self.hasher.update(data);
        self.written += data.len() as i64;
        Ok(())
    }

    pub fn written(&self) -> i64 {
        self.written
    }

    pub async fn finish(self) -> Result<StoredBlob> {
        self.file.sync_all().await?;
        drop(self.file);

        let rel = FileStore::shard_rel(&self.blob_id);
        let final_path = self.store.abs_path(&rel);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(&self.spill_path, &final_path).await?;

        Ok(StoredBlob {
            rel_path: rel,
            size: self.written,
            sha256: format!("{:x}", self.hasher.finalize()),
        })
    }

    pub async fn abort(self) -> Result<()> {
        drop(self.file);
        match fs::remove_file(&self.spill_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_rel() {
        assert_eq!(
            FileStore::shard_rel("abcd1234"),
            "ab/cd/abcd1234".to_string()
        );
    }
}
