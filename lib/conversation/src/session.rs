//! Persisted conversation sessions.
//!
//! A session is the only state that survives between request/response
//! cycles: it records which multi-step command a chat is in and how far
//! it has progressed. Absence of a session means no flow is active.

use crate::error::ConversationError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use version_sentry_core::ChatId;

/// An in-progress multi-step conversation for one chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The chat this session belongs to. At most one session per chat.
    pub chat_id: ChatId,
    /// The command the chat is currently inside.
    pub command: String,
    /// Progress within the command, starting at 1.
    pub step: i16,
    /// Free-form data a flow may need to carry between steps.
    pub payload: Option<JsonValue>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session last advanced, if it has.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Durable store of in-progress sessions, keyed by chat id.
///
/// The store provides no locking: two near-simultaneous events for the
/// same chat may both read the same pre-transition session and issue
/// conflicting writes. Last write wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Point lookup, no side effects.
    async fn get(&self, chat_id: ChatId) -> Result<Option<Session>, Report<ConversationError>>;

    /// Updates the session for the chat, or inserts one if absent.
    ///
    /// Updating overwrites command/step/payload and touches
    /// `updated_at`; inserting sets `created_at`. Safe to call
    /// repeatedly with the same step.
    async fn set(
        &self,
        chat_id: ChatId,
        command: &str,
        step: i16,
        payload: Option<JsonValue>,
    ) -> Result<Session, Report<ConversationError>>;

    /// Removes the session if present. Absence is not an error.
    async fn delete(&self, chat_id: ChatId) -> Result<(), Report<ConversationError>>;
}
