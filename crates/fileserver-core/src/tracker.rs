use crate::{Error, Result, UploadSession, UploadStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory registry of active upload sessions. The server keeps the hot
/// state here and mirrors it to the database so sessions survive a restart.
#[derive(Clone, Default)]
pub struct UploadTracker {
    sessions: Arc<RwLock<HashMap<String, UploadSession>>>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: UploadSession) {
        let mut sessions = self.sessions.write().await;
        tracing::info!(
            "Tracking upload session: {} ({}, {} chunks)",
            session.filename,
            session.id,
            session.total_chunks
        );
        sessions.insert(session.id.clone(), session);
    }

    pub async fn get(&self, id: &str) -> Option<UploadSession> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Record a received chunk, returning the updated session. Expired
    /// sessions reject further chunks.
    pub async fn record_chunk(&self, id: &str, index: i64) -> Result<UploadSession> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;

        if session.is_expired(Utc::now()) {
            session.status = UploadStatus::Expired;
            return Err(Error::SessionExpired(id.to_string()));
        }

        session.record_chunk(index)?;
        Ok(session.clone())
    }

    pub async fn remove(&self, id: &str) -> Option<UploadSession> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id)
    }

    pub async fn active_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|s| s.status == UploadStatus::Active)
            .count()
    }

    /// Drop sessions past their TTL, returning the evicted ids.
    pub async fn evict_expired(&self) -> Vec<String> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let expired: Vec<String> = sessions
            .values()
            .filter(|s| s.is_expired(now))
            .map(|s| s.id.clone())
            .collect();

        for id in &expired {
            sessions.remove(id);
            tracing::info!("Evicted expired upload session: {}", id);
        }

        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> UploadSession {
        UploadSession::new("a.bin".to_string(), 20, 10, 24).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let tracker = UploadTracker::new();
        let s = session();
        let id = s.id.clone();
        tracker.insert(s).await;

        assert!(tracker.get(&id).await.is_some());
        assert_eq!(tracker.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_record_chunk_unknown_session() {
        let tracker = UploadTracker::new();
        assert!(matches!(
            tracker.record_chunk("nope", 0).await,
            Err(Error::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_record_chunk_completes() {
        let tracker = UploadTracker::new();
        let s = session();
        let id = s.id.clone();
        tracker.insert(s).await;

        tracker.record_chunk(&id, 0).await.unwrap();
        let updated = tracker.record_chunk(&id, 1).await.unwrap();
        assert!(updated.is_complete());
    }

    #[tokio::test]
    async fn test_remove() {
        let tracker = UploadTracker::new();
        let s = session();
        let id = s.id.clone();
        tracker.insert(s).await;

        assert!(tracker.remove(&id).await.is_some());
        assert!(tracker.get(&id).await.is_none());
    }
}
