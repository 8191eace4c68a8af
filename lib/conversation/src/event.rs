//! Normalized inbound events.
//!
//! The transport layer parses its own envelope and hands the core one
//! of these two shapes. The core never sees transport-specific fields.

use serde::{Deserialize, Serialize};
use version_sentry_core::{ChatId, MessageId};

/// Display attributes of the chat a message came from.
///
/// Only used when registering a chat on first contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// One inbound conversational event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A free-text message.
    Text {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
        profile: ChatProfile,
    },
    /// A selection callback from an inline choice button.
    Selection {
        chat_id: ChatId,
        /// The message the buttons were attached to.
        message_id: MessageId,
        value: String,
    },
}

impl InboundEvent {
    /// The chat this event belongs to.
    #[must_use]
    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::Text { chat_id, .. } | Self::Selection { chat_id, .. } => *chat_id,
        }
    }

    /// The message id carried by the event.
    #[must_use]
    pub fn message_id(&self) -> MessageId {
        match self {
            Self::Text { message_id, .. } | Self::Selection { message_id, .. } => *message_id,
        }
    }

    /// Returns true for selection callbacks.
    #[must_use]
    pub fn is_selection(&self) -> bool {
        matches!(self, Self::Selection { .. })
    }
}
