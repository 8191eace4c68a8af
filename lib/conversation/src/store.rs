//! Storage trait seams for product and subscription data.
//!
//! The conversation core only reads products and writes subscriptions
//! through these traits; the server provides Postgres-backed
//! implementations and tests provide in-memory ones.

use crate::error::ConversationError;
use crate::event::ChatProfile;
use async_trait::async_trait;
use chrono::NaiveDate;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use version_sentry_core::{ChatId, ProductId};

/// A product as presented in selection keyboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
}

/// One recorded release of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseLine {
    pub version: String,
    pub release_date: NaiveDate,
}

/// A watched product together with its most recent releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedProduct {
    pub name: String,
    pub recent: Vec<ReleaseLine>,
}

/// Read access to the product catalog.
#[async_trait]
pub trait ProductDirectory: Send + Sync {
    /// Case-insensitive substring search over product names.
    async fn search(
        &self,
        keyword: &str,
    ) -> Result<Vec<ProductSummary>, Report<ConversationError>>;

    /// Point lookup by id.
    async fn get(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductSummary>, Report<ConversationError>>;
}

/// A chat's watch list: its standing interest in products.
#[async_trait]
pub trait WatchList: Send + Sync {
    /// Whether the chat already watches the product.
    async fn contains(
        &self,
        chat_id: ChatId,
        product_id: ProductId,
    ) -> Result<bool, Report<ConversationError>>;

    /// Adds a (chat, product) entry. The storage layer enforces
    /// uniqueness of the pair.
    async fn add(
        &self,
        chat_id: ChatId,
        product_id: ProductId,
    ) -> Result<(), Report<ConversationError>>;

    /// Removes the entry matching the product name. Returns the
    /// product name as stored when an entry was removed.
    async fn remove(
        &self,
        chat_id: ChatId,
        product_name: &str,
    ) -> Result<Option<String>, Report<ConversationError>>;

    /// The chat's watched products with up to three most recent
    /// releases each, ordered by product name.
    async fn overview(
        &self,
        chat_id: ChatId,
    ) -> Result<Vec<WatchedProduct>, Report<ConversationError>>;
}

/// Registry of known chats.
#[async_trait]
pub trait ChatDirectory: Send + Sync {
    /// Records the chat on first contact; a no-op if already known.
    async fn register(
        &self,
        chat_id: ChatId,
        profile: &ChatProfile,
    ) -> Result<(), Report<ConversationError>>;
}
