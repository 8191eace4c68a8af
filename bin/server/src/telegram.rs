//! Telegram Bot API client.
//!
//! Only the notification dispatcher calls the Bot API directly; all
//! conversation replies ride back on the webhook response instead.

use crate::jobs::notify::{MessageSender, NotifyError};
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::Serialize;
use version_sentry_core::ChatId;

#[derive(Serialize)]
struct SendMessageBody<'a> {
    chat_id: i64,
    parse_mode: &'static str,
    text: &'a str,
}

/// Client for outbound Bot API calls.
pub struct TelegramClient {
    http: reqwest::Client,
    send_message_url: String,
}

impl TelegramClient {
    /// Creates a client authenticated with the given bot token.
    pub fn new(bot_token: &str) -> Result<Self, Report<NotifyError>> {
        let http = reqwest::Client::builder()
            .user_agent("version-sentry")
            .build()
            .map_err(|e| NotifyError::Send {
                details: e.to_string(),
            })?;
        Ok(Self {
            http,
            send_message_url: format!("https://api.telegram.org/bot{bot_token}/sendMessage"),
        })
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), Report<NotifyError>> {
        let response = self
            .http
            .post(&self.send_message_url)
            .json(&SendMessageBody {
                chat_id: chat_id.as_i64(),
                parse_mode: "HTML",
                text,
            })
            .send()
            .await
            .map_err(|e| NotifyError::Send {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Send {
                details: format!("sendMessage returned {status}: {body}"),
            }
            .into());
        }

        Ok(())
    }
}
