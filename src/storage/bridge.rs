//! Persistence bridge: the two durable slices
//!
//! The wishlist is user-level and shared by every conversation; the
//! conversation history is the whole store. Reads never fail: missing,
//! unreadable, or corrupt data degrades to the empty/default seed.

use std::sync::Arc;

use crate::catalog::Product;
use crate::conversation::Conversation;

use super::{Storage, StorageError};

pub const WISHLIST_KEY: &str = "wishlist";
pub const HISTORY_KEY: &str = "conversation_history";

#[derive(Clone, Default)]
pub struct PersistenceBridge {
    storage: Option<Arc<dyn Storage>>,
}

impl PersistenceBridge {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    /// No persistence substrate; everything lives in memory
    pub fn unavailable() -> Self {
        Self { storage: None }
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match &self.storage {
            Some(storage) => storage.get(key).await,
            None => Ok(None),
        }
    }

    async fn write(&self, key: &str, value: String) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(e) = storage.set(key, &value).await {
            tracing::warn!("Failed to persist {}: {}", key, e);
        }
    }

    pub async fn load_wishlist(&self) -> Vec<Product> {
        match self.try_load_wishlist().await {
            Ok(wishlist) => wishlist,
            Err(e) => {
                tracing::warn!("Ignoring unreadable wishlist: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_load_wishlist(&self) -> Result<Vec<Product>, StorageError> {
        match self.read(WISHLIST_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn save_wishlist(&self, wishlist: &[Product]) {
        match serde_json::to_string(wishlist) {
            Ok(json) => self.write(WISHLIST_KEY, json).await,
            Err(e) => tracing::warn!("Failed to encode wishlist: {}", e),
        }
    }

    /// Persisted conversations, or `None` when the caller should seed a default
    pub async fn load_history(&self) -> Option<Vec<Conversation>> {
        match self.try_load_history().await {
            Ok(Some(history)) if !history.is_empty() => Some(history),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Ignoring unreadable conversation history: {}", e);
                None
            }
        }
    }

    async fn try_load_history(&self) -> Result<Option<Vec<Conversation>>, StorageError> {
        let Some(raw) = self.read(HISTORY_KEY).await? else {
            return Ok(None);
        };
        // Messages decode through Message::decode; an unknown variant fails the whole load
        let history: Vec<Conversation> = serde_json::from_str(&raw)?;
        Ok(Some(history))
    }

    pub async fn save_history(&self, conversations: &[Conversation]) {
        match serde_json::to_string(conversations) {
            Ok(json) => self.write(HISTORY_KEY, json).await,
            Err(e) => tracing::warn!("Failed to encode conversation history: {}", e),
        }
    }
}
