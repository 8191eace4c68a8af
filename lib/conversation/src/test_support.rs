//! In-memory fakes for the storage trait seams, used across the
//! crate's tests.

use crate::error::ConversationError;
use crate::event::ChatProfile;
use crate::session::{Session, SessionStore};
use crate::store::{ChatDirectory, ProductDirectory, ProductSummary, WatchList, WatchedProduct};
use async_trait::async_trait;
use chrono::Utc;
use rootcause::prelude::Report;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use version_sentry_core::{ChatId, ProductId};

/// Map-backed session store.
pub(crate) struct MemorySessions {
    inner: Mutex<HashMap<ChatId, Session>>,
}

impl MemorySessions {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Seeds a session directly, bypassing the store contract.
    pub(crate) async fn force_step(&self, chat_id: ChatId, command: &str, step: i16) {
        let _ = self.set(chat_id, command, step, None).await;
    }

    /// The persisted step for a chat, if a session exists.
    pub(crate) fn step_of(&self, chat_id: ChatId) -> Option<i16> {
        self.inner
            .lock()
            .unwrap()
            .get(&chat_id)
            .map(|session| session.step)
    }
}

#[async_trait]
impl SessionStore for MemorySessions {
    async fn get(&self, chat_id: ChatId) -> Result<Option<Session>, Report<ConversationError>> {
        Ok(self.inner.lock().unwrap().get(&chat_id).cloned())
    }

    async fn set(
        &self,
        chat_id: ChatId,
        command: &str,
        step: i16,
        payload: Option<JsonValue>,
    ) -> Result<Session, Report<ConversationError>> {
        let mut inner = self.inner.lock().unwrap();
        let session = match inner.get(&chat_id) {
            Some(existing) => Session {
                command: command.to_string(),
                step,
                payload,
                updated_at: Some(Utc::now()),
                ..existing.clone()
            },
            None => Session {
                chat_id,
                command: command.to_string(),
                step,
                payload,
                created_at: Utc::now(),
                updated_at: None,
            },
        };
        inner.insert(chat_id, session.clone());
        Ok(session)
    }

    async fn delete(&self, chat_id: ChatId) -> Result<(), Report<ConversationError>> {
        self.inner.lock().unwrap().remove(&chat_id);
        Ok(())
    }
}

/// Fixed product list with substring search.
pub(crate) struct MemoryCatalog {
    products: Vec<ProductSummary>,
}

impl MemoryCatalog {
    pub(crate) fn new(products: Vec<ProductSummary>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl ProductDirectory for MemoryCatalog {
    async fn search(
        &self,
        keyword: &str,
    ) -> Result<Vec<ProductSummary>, Report<ConversationError>> {
        let needle = keyword.to_lowercase();
        Ok(self
            .products
            .iter()
            .filter(|product| product.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn get(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductSummary>, Report<ConversationError>> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }
}

/// Map-backed watch list; entries carry the product name so removal
/// and overview can render it.
pub(crate) struct MemoryWatchList {
    entries: Mutex<HashMap<(ChatId, ProductId), String>>,
}

impl MemoryWatchList {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn insert(&self, chat_id: ChatId, product_id: ProductId) {
        self.insert_named(chat_id, product_id, &format!("product-{product_id}"));
    }

    pub(crate) fn insert_named(&self, chat_id: ChatId, product_id: ProductId, name: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert((chat_id, product_id), name.to_string());
    }

    pub(crate) fn has(&self, chat_id: ChatId, product_id: ProductId) -> bool {
        self.entries
            .lock()
            .unwrap()
            .contains_key(&(chat_id, product_id))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl WatchList for MemoryWatchList {
    async fn contains(
        &self,
        chat_id: ChatId,
        product_id: ProductId,
    ) -> Result<bool, Report<ConversationError>> {
        Ok(self.has(chat_id, product_id))
    }

    async fn add(
        &self,
        chat_id: ChatId,
        product_id: ProductId,
    ) -> Result<(), Report<ConversationError>> {
        self.insert(chat_id, product_id);
        Ok(())
    }

    async fn remove(
        &self,
        chat_id: ChatId,
        product_name: &str,
    ) -> Result<Option<String>, Report<ConversationError>> {
        let mut entries = self.entries.lock().unwrap();
        let key = entries
            .iter()
            .find(|((chat, _), name)| *chat == chat_id && name.as_str() == product_name)
            .map(|(key, _)| *key);
        Ok(key.and_then(|key| entries.remove(&key)))
    }

    async fn overview(
        &self,
        chat_id: ChatId,
    ) -> Result<Vec<WatchedProduct>, Report<ConversationError>> {
        let mut watched: Vec<WatchedProduct> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|((chat, _), _)| *chat == chat_id)
            .map(|(_, name)| WatchedProduct {
                name: name.clone(),
                recent: Vec::new(),
            })
            .collect();
        watched.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(watched)
    }
}

/// Set-backed chat registry.
pub(crate) struct MemoryChats {
    registered: Mutex<HashSet<ChatId>>,
}

impl MemoryChats {
    pub(crate) fn new() -> Self {
        Self {
            registered: Mutex::new(HashSet::new()),
        }
    }

    pub(crate) fn is_registered(&self, chat_id: ChatId) -> bool {
        self.registered.lock().unwrap().contains(&chat_id)
    }
}

#[async_trait]
impl ChatDirectory for MemoryChats {
    async fn register(
        &self,
        chat_id: ChatId,
        _profile: &ChatProfile,
    ) -> Result<(), Report<ConversationError>> {
        self.registered.lock().unwrap().insert(chat_id);
        Ok(())
    }
}
