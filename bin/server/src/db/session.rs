//! Session persistence.
//!
//! One row per chat with an in-progress flow; the row is the only
//! state that survives between webhook invocations.

use crate::db::storage_error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};
use version_sentry_conversation::{ConversationError, Session, SessionStore};
use version_sentry_core::ChatId;

/// Repository for session rows.
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

#[derive(FromRow)]
struct SessionRow {
    chat_id: i64,
    command: String,
    step: i16,
    payload: Option<JsonValue>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            chat_id: ChatId::new(self.chat_id),
            command: self.command,
            step: self.step,
            payload: self.payload,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl SessionRepository {
    /// Creates a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn get(&self, chat_id: ChatId) -> Result<Option<Session>, Report<ConversationError>> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT chat_id, command, step, payload, created_at, updated_at
            FROM session
            WHERE chat_id = $1
            "#,
        )
        .bind(chat_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(SessionRow::into_session))
    }

    async fn set(
        &self,
        chat_id: ChatId,
        command: &str,
        step: i16,
        payload: Option<JsonValue>,
    ) -> Result<Session, Report<ConversationError>> {
        // Idempotent overwrite: created_at survives conflicts, only
        // updates touch updated_at.
        let row: SessionRow = sqlx::query_as(
            r#"
            INSERT INTO session (chat_id, command, step, payload, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (chat_id) DO UPDATE
            SET command = EXCLUDED.command,
                step = EXCLUDED.step,
                payload = EXCLUDED.payload,
                updated_at = $5
            RETURNING chat_id, command, step, payload, created_at, updated_at
            "#,
        )
        .bind(chat_id.as_i64())
        .bind(command)
        .bind(step)
        .bind(payload)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.into_session())
    }

    async fn delete(&self, chat_id: ChatId) -> Result<(), Report<ConversationError>> {
        sqlx::query(
            r#"
            DELETE FROM session
            WHERE chat_id = $1
            "#,
        )
        .bind(chat_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }
}
