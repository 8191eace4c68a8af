//! Outbound replies.
//!
//! A reply is either a new message or an edit of an earlier one, with
//! optional choice buttons. Text is HTML-formatted for the transport;
//! user-visible failures are always a short italic status line.

use serde::{Deserialize, Serialize};
use version_sentry_core::{ChatId, MessageId};

/// Callback value carried by every cancel button.
pub const CANCEL_VALUE: &str = "cancel";

/// How a reply should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyMode {
    /// Send a new message.
    NewMessage,
    /// Edit the message the triggering callback originated from.
    EditMessage { message_id: MessageId },
}

/// A single choice button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Label shown to the user.
    pub label: String,
    /// Value delivered back as a selection callback.
    pub value: String,
}

impl Button {
    /// Creates a new button.
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// The cancel button present in every selection keyboard.
    #[must_use]
    pub fn cancel() -> Self {
        Self::new("❌ Cancel", CANCEL_VALUE)
    }
}

/// An outbound reply produced by the conversation core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub mode: ReplyMode,
    pub chat_id: ChatId,
    pub text: String,
    /// Rows of choice buttons, if any.
    pub keyboard: Option<Vec<Vec<Button>>>,
}

impl Reply {
    /// Creates a new-message reply.
    #[must_use]
    pub fn message(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            mode: ReplyMode::NewMessage,
            chat_id,
            text: text.into(),
            keyboard: None,
        }
    }

    /// Creates an edit-message reply.
    #[must_use]
    pub fn edit(chat_id: ChatId, message_id: MessageId, text: impl Into<String>) -> Self {
        Self {
            mode: ReplyMode::EditMessage { message_id },
            chat_id,
            text: text.into(),
            keyboard: None,
        }
    }

    /// Attaches choice buttons.
    #[must_use]
    pub fn with_keyboard(mut self, keyboard: Vec<Vec<Button>>) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    /// Attaches a keyboard containing only the cancel button.
    #[must_use]
    pub fn with_cancel_row(self) -> Self {
        self.with_keyboard(vec![vec![Button::cancel()]])
    }
}

/// Escapes text for embedding in HTML-formatted replies.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps already-escaped text in italics.
#[must_use]
pub fn italic(text: &str) -> String {
    format!("<i>{text}</i>")
}

/// Wraps already-escaped text in bold.
#[must_use]
pub fn bold(text: &str) -> String {
    format!("<b>{text}</b>")
}

/// Wraps already-escaped text in a monospace span.
#[must_use]
pub fn code(text: &str) -> String {
    format!("<code>{text}</code>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_button_value() {
        let button = Button::cancel();
        assert_eq!(button.value, CANCEL_VALUE);
        assert!(button.label.contains("Cancel"));
    }

    #[test]
    fn escape_replaces_html_metacharacters() {
        assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn with_cancel_row_adds_single_button() {
        let reply = Reply::message(ChatId::new(1), "hi").with_cancel_row();
        let keyboard = reply.keyboard.expect("keyboard");
        assert_eq!(keyboard.len(), 1);
        assert_eq!(keyboard[0].len(), 1);
        assert_eq!(keyboard[0][0].value, CANCEL_VALUE);
    }
}
