//! Chat registry.

use crate::db::storage_error;
use async_trait::async_trait;
use chrono::Utc;
use rootcause::prelude::Report;
use sqlx::PgPool;
use version_sentry_conversation::{ChatDirectory, ChatProfile, ConversationError};
use version_sentry_core::ChatId;

/// Repository for chat rows.
#[derive(Clone)]
pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    /// Creates a new chat repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatDirectory for ChatRepository {
    async fn register(
        &self,
        chat_id: ChatId,
        profile: &ChatProfile,
    ) -> Result<(), Report<ConversationError>> {
        sqlx::query(
            r#"
            INSERT INTO chat (id, username, first_name, last_name, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(chat_id.as_i64())
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }
}
