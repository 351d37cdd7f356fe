use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    Active,
    Complete,
    Expired,
    Aborted,
}

/// A resumable chunked upload in progress. The client declares the total
/// size up front; chunks may arrive in any order and may be retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSession {
    pub id: String,
    pub filename: String,
    pub total_size: i64,
    pub chunk_size: i64,
    pub total_chunks: i64,
    pub received: BTreeSet<i64>,
    pub status: UploadStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl UploadSession {
    pub fn new(
        filename: String,
        total_size: i64,
        chunk_size: i64,
        ttl_hours: i64,
    ) -> Result<Self> {
        if total_size <= 0 {
            return Err(Error::InvalidUpload(format!(
                "total_size must be positive, got {}",
                total_size
            )));
        }
        if chunk_size <= 0 {
            return Err(Error::InvalidUpload(format!(
                "chunk_size must be positive, got {}",
                chunk_size
            )));
        }

        let total_chunks = (total_size + chunk_size - 1) / chunk_size;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            filename,
            total_size,
            chunk_size,
            total_chunks,
            received: BTreeSet::new(),
            status: UploadStatus::Active,
            created_at: now,
            expires_at: now + Duration::hours(ttl_hours),
        })
    }

    /// Expected byte length of the given chunk. Only the last chunk may be
    /// shorter than chunk_size.
    pub fn expected_chunk_len(&self, index: i64) -> Result<i64> {
        if index < 0 || index >= self.total_chunks {
            return Err(Error::ChunkOutOfRange {
                index,
                total: self.total_chunks,
            });
        }
        if index == self.total_chunks - 1 {
            let tail = self.total_size - index * self.chunk_size;
            Ok(tail)
        } else {
            Ok(self.chunk_size)
        }
    }

    /// Record a chunk as received. Re-recording an index is a no-op.
    pub fn record_chunk(&mut self, index: i64) -> Result<()> {
        if index < 0 || index >= self.total_chunks {
            return Err(Error::ChunkOutOfRange {
                index,
                total: self.total_chunks,
            });
        }
        self.received.insert(index);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.received.len() as i64 == self.total_chunks
    }

    pub fn missing_chunks(&self) -> Vec<i64> {
        (0..self.total_chunks)
            .filter(|i| !self.received.contains(i))
            .collect()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(total: i64, chunk: i64) -> UploadSession {
        UploadSession::new("big.bin".to_string(), total, chunk, 24).unwrap()
    }

    #[test]
    fn test_chunk_count_rounds_up() {
        assert_eq!(session(100, 10).total_chunks, 10);
        assert_eq!(session(101, 10).total_chunks, 11);
        assert_eq!(session(1, 10).total_chunks, 1);
    }

    #[test]
    fn test_rejects_bad_sizes() {
        assert!(UploadSession::new("x".into(), 0, 10, 24).is_err());
        assert!(UploadSession::new("x".into(), -5, 10, 24).is_err());
        assert!(UploadSession::new("x".into(), 10, 0, 24).is_err());
    }

    #[test]
    fn test_expected_chunk_len() {
        let s = session(25, 10);
        assert_eq!(s.expected_chunk_len(0).unwrap(), 10);
        assert_eq!(s.expected_chunk_len(1).unwrap(), 10);
        assert_eq!(s.expected_chunk_len(2).unwrap(), 5);
        assert!(s.expected_chunk_len(3).is_err());
        assert!(s.expected_chunk_len(-1).is_err());
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut s = session(25, 10);
        s.record_chunk(1).unwrap();
        s.record_chunk(1).unwrap();
        assert_eq!(s.received.len(), 1);
        assert!(!s.is_complete());

        s.record_chunk(0).unwrap();
        s.record_chunk(2).unwrap();
        assert!(s.is_complete());
        assert!(s.missing_chunks().is_empty());
    }

    #[test]
    fn test_missing_chunks() {
        let mut s = session(30, 10);
        s.record_chunk(1).unwrap();
        assert_eq!(s.missing_chunks(), vec![0, 2]);
    }

    #[test]
    fn test_record_out_of_range() {
        let mut s = session(30, 10);
        assert!(s.record_chunk(3).is_err());
        assert!(s.record_chunk(-1).is_err());
    }

    #[test]
    fn test_expiry() {
        let s = session(10, 10);
        assert!(!s.is_expired(Utc::now()));
        assert!(s.is_expired(Utc::now() + Duration::hours(25)));
    }
}
