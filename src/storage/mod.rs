//! Durable client-side storage
//!
//! A narrow key-value interface holding JSON strings, with a SQLite backend
//! for real use and an in-memory one for tests. The [`PersistenceBridge`] is
//! the only code that reads or writes it.

mod bridge;
mod sqlite;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

pub use bridge::PersistenceBridge;
#[cfg(test)]
pub use bridge::{HISTORY_KEY, WISHLIST_KEY};
pub use sqlite::SqliteStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage; contents vanish with the process
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert!(storage.get("wishlist").await.unwrap().is_none());

        storage.set("wishlist", "[]").await.unwrap();
        assert_eq!(storage.get("wishlist").await.unwrap().as_deref(), Some("[]"));

        storage.remove("wishlist").await.unwrap();
        assert!(storage.get("wishlist").await.unwrap().is_none());
    }
}
