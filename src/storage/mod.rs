//! Key-value persistence, mirroring the flat storage the host exposes.
//!
//! Each logical collection (session lists, individual settings) lives
//! under one string key as a JSON value. The backend provides no
//! concurrent-writer guarantees; all mutations are read-modify-write and
//! last-writer-wins is the accepted failure mode.

mod memory;
mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

/// Storage backend for JSON values keyed by string.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the value under a key, or `None` if the key is unset.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Write the value under a key, replacing any previous value.
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()>;

    /// Remove a key. Removing an unset key is a no-op.
    async fn remove(&self, key: &str) -> Result<()>;
}
