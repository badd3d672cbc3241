use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::KvStore;

/// In-memory store. Used for ephemeral engine instances and tests; state
/// is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryKvStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);

        store.set("key", json!({"a": 1})).await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some(json!({"a": 1})));

        store.set("key", json!([1, 2, 3])).await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some(json!([1, 2, 3])));

        store.remove("key").await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), None);
    }
}
