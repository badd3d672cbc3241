use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::task;
use tracing::debug;

use super::KvStore;

/// SQLite-backed key-value store.
///
/// One `kv` table, one row per key, values serialized as JSON text. The
/// connection is opened per operation inside `spawn_blocking` so the
/// async runtime is never blocked on disk I/O.
pub struct SqliteKvStore {
    /// Path to the SQLite database file
    db_path: PathBuf,
}

impl SqliteKvStore {
    /// Create a new store at the given path.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        // Create parent directories if they don't exist
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let store = Self { db_path };
        store.init_schema()?;

        Ok(store)
    }

    /// Create a store at the default location (~/.tab-warden/store.db).
    pub fn default_location() -> Result<Self> {
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        let db_path = PathBuf::from(home).join(".tab-warden").join("store.db");
        Self::new(db_path)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)
            .with_context(|| format!("failed to open database: {}", self.db_path.display()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .context("failed to create kv table")?;

        debug!(path = %self.db_path.display(), "initialized SQLite store");

        Ok(())
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let key = key.to_string();
        let db_path = self.db_path.clone();

        task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;

            let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
            let result = stmt.query_row([&key], |row| {
                let text: String = row.get(0)?;
                Ok(text)
            });

            match result {
                Ok(text) => {
                    let value: serde_json::Value = serde_json::from_str(&text)
                        .with_context(|| format!("corrupt value under key '{}'", key))?;
                    Ok(Some(value))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .context("spawn_blocking failed")?
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let key = key.to_string();
        let db_path = self.db_path.clone();

        task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            let text = serde_json::to_string(&value)?;

            conn.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                rusqlite::params![key, text],
            )?;

            debug!(key = %key, "wrote storage key");

            Ok::<_, anyhow::Error>(())
        })
        .await
        .context("spawn_blocking failed")??;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        let db_path = self.db_path.clone();

        task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            conn.execute("DELETE FROM kv WHERE key = ?1", [&key])?;
            debug!(key = %key, "removed storage key");
            Ok::<_, anyhow::Error>(())
        })
        .await
        .context("spawn_blocking failed")??;

        Ok(())
    }
}
