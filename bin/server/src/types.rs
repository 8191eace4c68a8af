//! Telegram wire types and their mapping to the conversation core.
//!
//! The webhook receives Telegram's update envelope and answers with a
//! webhook-reply body; the core only ever sees the normalized
//! [`InboundEvent`]/[`Reply`] shapes.

use serde::{Deserialize, Serialize};
use version_sentry_conversation::{ChatProfile, InboundEvent, Reply, ReplyMode};
use version_sentry_core::{ChatId, MessageId};

/// One incoming update from the Telegram webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    #[allow(dead_code)]
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
    pub callback_query: Option<TelegramCallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramCallbackQuery {
    #[allow(dead_code)]
    pub id: String,
    pub from: TelegramUser,
    pub message: Option<TelegramMessage>,
    pub data: Option<String>,
}

/// Result of normalizing an update envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// A routable event.
    Event(InboundEvent),
    /// A message the core cannot process (stickers, photos, ...).
    NonText { chat_id: ChatId },
    /// Nothing routable in the envelope; acknowledge and drop.
    Ignored,
}

/// Extracts the normalized event from an update envelope.
#[must_use]
pub fn normalize(update: TelegramUpdate) -> Normalized {
    if let Some(callback) = update.callback_query {
        let (Some(message), Some(data)) = (callback.message, callback.data) else {
            return Normalized::Ignored;
        };
        return Normalized::Event(InboundEvent::Selection {
            chat_id: ChatId::new(callback.from.id),
            message_id: MessageId::new(message.message_id),
            value: data,
        });
    }

    if let Some(message) = update.message {
        let chat_id = ChatId::new(message.chat.id);
        let Some(text) = message.text else {
            return Normalized::NonText { chat_id };
        };
        return Normalized::Event(InboundEvent::Text {
            chat_id,
            message_id: MessageId::new(message.message_id),
            text,
            profile: ChatProfile {
                username: message.chat.username,
                first_name: message.chat.first_name,
                last_name: message.chat.last_name,
            },
        });
    }

    Normalized::Ignored
}

/// Body returned from the webhook, executed by Telegram as a bot
/// method call.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookReply {
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    pub chat_id: i64,
    pub parse_mode: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Inline(InlineKeyboardMarkup),
    Keyboard(ReplyKeyboardMarkup),
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

/// The persistent command shortcut keyboard shown under the input box.
#[must_use]
pub fn default_reply_markup() -> ReplyMarkup {
    let rows = [["/watch", "/watch list"], ["/unwatch", "/chat id"]];
    ReplyMarkup::Keyboard(ReplyKeyboardMarkup {
        keyboard: rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|text| KeyboardButton {
                        text: (*text).to_string(),
                    })
                    .collect()
            })
            .collect(),
        resize_keyboard: true,
    })
}

impl From<Reply> for WebhookReply {
    fn from(reply: Reply) -> Self {
        let (method, message_id) = match reply.mode {
            ReplyMode::NewMessage => ("sendMessage", None),
            ReplyMode::EditMessage { message_id } => {
                ("editMessageText", Some(message_id.as_i64()))
            }
        };

        let reply_markup = match reply.keyboard {
            Some(keyboard) => Some(ReplyMarkup::Inline(InlineKeyboardMarkup {
                inline_keyboard: keyboard
                    .into_iter()
                    .map(|row| {
                        row.into_iter()
                            .map(|button| InlineKeyboardButton {
                                text: button.label,
                                callback_data: button.value,
                            })
                            .collect()
                    })
                    .collect(),
            })),
            // Plain new messages refresh the command shortcut keyboard;
            // edits may not carry one.
            None => match method {
                "sendMessage" => Some(default_reply_markup()),
                _ => None,
            },
        };

        Self {
            method,
            message_id,
            chat_id: reply.chat_id.as_i64(),
            parse_mode: "HTML",
            text: reply.text,
            reply_markup,
        }
    }
}
