//! Bounded, ordered session collections over the key-value store.
//!
//! Three independent lists: manual saves (cap 20, oldest evicted from the
//! front), auto saves and closed sessions (caps 50 and 20, newest first,
//! truncated from the tail). Every mutation is read-modify-write against
//! a single storage key; the backend offers no locking, and last-writer-
//! wins on concurrent mutation is accepted.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::storage::KvStore;

use super::record::{SessionKind, SessionRecord};

#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KvStore>,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Read a whole collection. Missing keys yield an empty list; entries
    /// that fail to deserialize are skipped with a warning rather than
    /// poisoning the rest of the collection.
    pub async fn list(&self, kind: SessionKind) -> Result<Vec<SessionRecord>> {
        let key = kind.storage_key();
        let Some(value) = self.kv.get(key).await? else {
            return Ok(Vec::new());
        };

        let entries = match value {
            serde_json::Value::Array(entries) => entries,
            other => {
                warn!(key, ?other, "session collection is not an array, resetting");
                return Ok(Vec::new());
            }
        };

        let mut sessions = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<SessionRecord>(entry) {
                Ok(record) => sessions.push(record),
                Err(e) => warn!(key, error = %e, "skipping invalid session entry"),
            }
        }
        Ok(sessions)
    }

    /// Append a manual session; the oldest entry is evicted once the
    /// collection is over its cap.
    pub async fn push_manual(&self, record: SessionRecord) -> Result<()> {
        let kind = SessionKind::Manual;
        let mut sessions = self.list(kind).await?;
        sessions.push(record);
        while sessions.len() > kind.cap() {
            sessions.remove(0);
        }
        self.write(kind, &sessions).await
    }

    /// Prepend an auto-saved session and truncate to the cap.
    pub async fn push_auto(&self, record: SessionRecord) -> Result<()> {
        self.push_front(SessionKind::Auto, record).await
    }

    /// Prepend a closed session and truncate to the cap.
    pub async fn push_closed(&self, record: SessionRecord) -> Result<()> {
        self.push_front(SessionKind::Closed, record).await
    }

    async fn push_front(&self, kind: SessionKind, record: SessionRecord) -> Result<()> {
        let mut sessions = self.list(kind).await?;
        sessions.insert(0, record);
        sessions.truncate(kind.cap());
        self.write(kind, &sessions).await
    }

    /// The most recent auto-saved session, if any.
    pub async fn latest_auto(&self) -> Result<Option<SessionRecord>> {
        Ok(self.list(SessionKind::Auto).await?.into_iter().next())
    }

    /// Look a session up by id: manual first, then auto, then closed.
    /// Ids are namespaced by prefix, but the lookup order is still the
    /// tie-break rule.
    pub async fn find(&self, session_id: &str) -> Result<Option<(SessionRecord, SessionKind)>> {
        for kind in [SessionKind::Manual, SessionKind::Auto, SessionKind::Closed] {
            let sessions = self.list(kind).await?;
            if let Some(record) = sessions.into_iter().find(|s| s.id == session_id) {
                return Ok(Some((record, kind)));
            }
        }
        Ok(None)
    }

    /// Delete one session from the named collection.
    pub async fn delete(&self, session_id: &str, kind: SessionKind) -> Result<()> {
        let mut sessions = self.list(kind).await?;
        let before = sessions.len();
        sessions.retain(|s| s.id != session_id);
        if sessions.len() == before {
            return Err(EngineError::SessionNotFound(session_id.to_string()).into());
        }
        self.write(kind, &sessions).await?;
        debug!(session_id, %kind, "deleted session");
        Ok(())
    }

    /// Rename a manually saved session.
    pub async fn rename(&self, session_id: &str, new_name: &str) -> Result<()> {
        let kind = SessionKind::Manual;
        let mut sessions = self.list(kind).await?;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
        session.name = new_name.to_string();
        self.write(kind, &sessions).await?;
        debug!(session_id, new_name, "renamed session");
        Ok(())
    }

    /// Empty a whole collection.
    pub async fn clear(&self, kind: SessionKind) -> Result<()> {
        self.write(kind, &[]).await?;
        debug!(%kind, "cleared session collection");
        Ok(())
    }

    async fn write(&self, kind: SessionKind, sessions: &[SessionRecord]) -> Result<()> {
        let value = serde_json::to_value(sessions).context("failed to serialize sessions")?;
        self.kv.set(kind.storage_key(), value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKvStore;

    fn record(kind: SessionKind, name: &str) -> SessionRecord {
        SessionRecord::new(kind, name, vec![], vec![], 1, false)
    }

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryKvStore::new()))
    }

    #[tokio::test]
    async fn test_manual_cap_evicts_oldest() {
        let store = store();
        let mut first_id = None;
        for i in 0..25 {
            let r = record(SessionKind::Manual, &format!("s{}", i));
            if i == 0 {
                first_id = Some(r.id.clone());
            }
            store.push_manual(r).await.unwrap();
        }

        let sessions = store.list(SessionKind::Manual).await.unwrap();
        assert_eq!(sessions.len(), SessionKind::Manual.cap());
        // Oldest entries were evicted from the front
        assert!(!sessions.iter().any(|s| Some(&s.id) == first_id.as_ref()));
        assert_eq!(sessions.last().unwrap().name, "s24");
    }

    #[tokio::test]
    async fn test_auto_cap_keeps_newest_first() {
        let store = store();
        for i in 0..55 {
            store
                .push_auto(record(SessionKind::Auto, &format!("a{}", i)))
                .await
                .unwrap();
        }

        let sessions = store.list(SessionKind::Auto).await.unwrap();
        assert_eq!(sessions.len(), SessionKind::Auto.cap());
        assert_eq!(sessions[0].name, "a54");
        assert_eq!(sessions.last().unwrap().name, "a5");
    }

    #[tokio::test]
    async fn test_closed_cap() {
        let store = store();
        for i in 0..30 {
            store
                .push_closed(record(SessionKind::Closed, &format!("c{}", i)))
                .await
                .unwrap();
        }
        let sessions = store.list(SessionKind::Closed).await.unwrap();
        assert_eq!(sessions.len(), SessionKind::Closed.cap());
        assert_eq!(sessions[0].name, "c29");
    }

    #[tokio::test]
    async fn test_find_searches_manual_then_auto_then_closed() {
        let store = store();
        let manual = record(SessionKind::Manual, "m");
        let auto = record(SessionKind::Auto, "a");
        let closed = record(SessionKind::Closed, "c");
        store.push_manual(manual.clone()).await.unwrap();
        store.push_auto(auto.clone()).await.unwrap();
        store.push_closed(closed.clone()).await.unwrap();

        let (found, kind) = store.find(&auto.id).await.unwrap().unwrap();
        assert_eq!(found.id, auto.id);
        assert_eq!(kind, SessionKind::Auto);

        let (found, kind) = store.find(&closed.id).await.unwrap().unwrap();
        assert_eq!(found.id, closed.id);
        assert_eq!(kind, SessionKind::Closed);

        assert!(store.find("session_0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_and_rename() {
        let store = store();
        let manual = record(SessionKind::Manual, "before");
        store.push_manual(manual.clone()).await.unwrap();

        store.rename(&manual.id, "after").await.unwrap();
        let sessions = store.list(SessionKind::Manual).await.unwrap();
        assert_eq!(sessions[0].name, "after");

        store.delete(&manual.id, SessionKind::Manual).await.unwrap();
        assert!(store.list(SessionKind::Manual).await.unwrap().is_empty());

        let err = store.delete("session_404", SessionKind::Manual).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_clear() {
        let store = store();
        store.push_auto(record(SessionKind::Auto, "a")).await.unwrap();
        store.clear(SessionKind::Auto).await.unwrap();
        assert!(store.list(SessionKind::Auto).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_entries_are_skipped() {
        let kv = Arc::new(MemoryKvStore::new());
        let store = SessionStore::new(kv.clone());
        let good = record(SessionKind::Auto, "good");
        let value = serde_json::json!([
            serde_json::to_value(&good).unwrap(),
            {"bogus": true},
        ]);
        kv.set(SessionKind::Auto.storage_key(), value).await.unwrap();

        let sessions = store.list(SessionKind::Auto).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, good.id);
    }
}
