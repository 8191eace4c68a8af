//! Notification dispatch.
//!
//! After a sync run commits, each subscribed chat gets one aggregated
//! message covering every watched product that gained versions in that
//! run. A failed send is logged and skipped; it never blocks the other
//! chats.

use crate::db::product::{ProductDigest, product_digest, updated_product_ids};
use crate::db::subscription::chat_subscriptions;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use sqlx::PgPool;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use version_sentry_conversation::reply::{bold, code, escape};
use version_sentry_core::{ChatId, ProductId};

/// Versions shown per product in one notification.
const VERSIONS_PER_PRODUCT: i64 = 5;

/// Failure during notification dispatch.
#[derive(Debug)]
pub enum NotifyError {
    /// A message could not be delivered.
    Send { details: String },
    /// A dispatch query failed.
    Database { details: String },
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send { details } => write!(f, "message delivery failure: {details}"),
            Self::Database { details } => write!(f, "database failure: {details}"),
        }
    }
}

impl std::error::Error for NotifyError {}

impl From<sqlx::Error> for NotifyError {
    fn from(error: sqlx::Error) -> Self {
        Self::Database {
            details: error.to_string(),
        }
    }
}

/// Outbound message delivery.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Sends an HTML-formatted message to a chat.
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), Report<NotifyError>>;
}

/// The notification dispatcher.
pub struct Notifier {
    pool: PgPool,
    sender: Arc<dyn MessageSender>,
    send_delay: Duration,
}

impl Notifier {
    /// Creates a dispatcher delivering through the given sender.
    pub fn new(pool: PgPool, sender: Arc<dyn MessageSender>, send_delay: Duration) -> Self {
        Self {
            pool,
            sender,
            send_delay,
        }
    }

    /// Notifies every subscribed chat about versions the sync run with
    /// the given timestamp added. Returns the number of chats reached.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, stamped_at: DateTime<Utc>) -> Result<usize, Report<NotifyError>> {
        let updated = updated_product_ids(&self.pool, stamped_at)
            .await
            .map_err(NotifyError::from)?;
        if updated.is_empty() {
            tracing::debug!("no new versions, nothing to dispatch");
            return Ok(0);
        }

        let mut digests = HashMap::with_capacity(updated.len());
        for product_id in updated {
            let digest =
                product_digest(&self.pool, product_id, stamped_at, VERSIONS_PER_PRODUCT)
                    .await
                    .map_err(NotifyError::from)?;
            digests.insert(digest.id, digest);
        }

        let chats = chat_subscriptions(&self.pool)
            .await
            .map_err(NotifyError::from)?;

        let reached = dispatch(self.sender.as_ref(), self.send_delay, &chats, &digests).await;
        tracing::info!(chats = reached, products = digests.len(), "dispatch finished");
        Ok(reached)
    }
}

/// Sends one aggregated message per chat whose watch list intersects
/// the updated products. Send failures are logged per chat and the
/// loop continues.
pub async fn dispatch(
    sender: &dyn MessageSender,
    send_delay: Duration,
    chats: &[(ChatId, Vec<ProductId>)],
    digests: &HashMap<ProductId, ProductDigest>,
) -> usize {
    let mut reached = 0;
    for (chat_id, watched) in chats {
        let relevant: Vec<&ProductDigest> = watched
            .iter()
            .filter_map(|product_id| digests.get(product_id))
            .collect();
        if relevant.is_empty() {
            continue;
        }

        let text = render_notification(&relevant);
        tokio::time::sleep(send_delay).await;
        match sender.send(*chat_id, &text).await {
            Ok(()) => reached += 1,
            Err(error) => {
                tracing::warn!(chat_id = chat_id.as_i64(), %error, "notification send failed");
            }
        }
    }
    reached
}

/// Renders one chat's notification body.
#[must_use]
pub fn render_notification(digests: &[&ProductDigest]) -> String {
    let mut text = format!("{}\n", bold("Recent Release(s) Detected"));
    for digest in digests {
        text.push('\n');
        text.push_str(&bold(&escape(&digest.name.to_uppercase())));
        text.push('\n');
        for release in &digest.releases {
            text.push_str(&format!(
                "version: {} - release: {}\n",
                code(&escape(&release.version)),
                release.release_date,
            ));
        }
    }
    text
}
