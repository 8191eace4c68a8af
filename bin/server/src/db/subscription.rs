//! Subscription persistence.

use crate::db::storage_error;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rootcause::prelude::Report;
use sqlx::{FromRow, PgPool};
use version_sentry_conversation::{ConversationError, ReleaseLine, WatchList, WatchedProduct};
use version_sentry_core::{ChatId, ProductId};

/// Repository for subscription rows.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    /// Creates a new subscription repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct WatchedRow {
    product_id: i64,
    name: String,
}

#[derive(FromRow)]
struct ReleaseRow {
    version: String,
    release_date: NaiveDate,
}

#[async_trait]
impl WatchList for SubscriptionRepository {
    async fn contains(
        &self,
        chat_id: ChatId,
        product_id: ProductId,
    ) -> Result<bool, Report<ConversationError>> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM subscription
                WHERE chat_id = $1 AND product_id = $2
            )
            "#,
        )
        .bind(chat_id.as_i64())
        .bind(product_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(exists)
    }

    async fn add(
        &self,
        chat_id: ChatId,
        product_id: ProductId,
    ) -> Result<(), Report<ConversationError>> {
        sqlx::query(
            r#"
            INSERT INTO subscription (chat_id, product_id, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(chat_id.as_i64())
        .bind(product_id.as_i64())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn remove(
        &self,
        chat_id: ChatId,
        product_name: &str,
    ) -> Result<Option<String>, Report<ConversationError>> {
        let removed: Option<String> = sqlx::query_scalar(
            r#"
            DELETE FROM subscription s
            USING product p
            WHERE s.product_id = p.id
              AND s.chat_id = $1
              AND p.name = $2
            RETURNING p.name
            "#,
        )
        .bind(chat_id.as_i64())
        .bind(product_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(removed)
    }

    async fn overview(
        &self,
        chat_id: ChatId,
    ) -> Result<Vec<WatchedProduct>, Report<ConversationError>> {
        let watched: Vec<WatchedRow> = sqlx::query_as(
            r#"
            SELECT p.id AS product_id, p.name
            FROM subscription s
            INNER JOIN product p ON p.id = s.product_id
            WHERE s.chat_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(chat_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        let mut products = Vec::with_capacity(watched.len());
        for row in watched {
            let releases: Vec<ReleaseRow> = sqlx::query_as(
                r#"
                SELECT version, release_date
                FROM product_version
                WHERE product_id = $1
                ORDER BY release_date DESC
                LIMIT 3
                "#,
            )
            .bind(row.product_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

            products.push(WatchedProduct {
                name: row.name,
                recent: releases
                    .into_iter()
                    .map(|release| ReleaseLine {
                        version: release.version,
                        release_date: release.release_date,
                    })
                    .collect(),
            });
        }

        Ok(products)
    }
}

#[derive(FromRow)]
struct SubscriberRow {
    chat_id: i64,
    product_ids: Vec<i64>,
}

/// All chats with subscriptions, each with the set of products it
/// watches. The dispatcher intersects these with the updated set.
pub async fn chat_subscriptions(pool: &PgPool) -> Result<Vec<(ChatId, Vec<ProductId>)>, sqlx::Error> {
    let rows: Vec<SubscriberRow> = sqlx::query_as(
        r#"
        SELECT chat_id, array_agg(product_id) AS product_ids
        FROM subscription
        GROUP BY chat_id
        ORDER BY chat_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            (
                ChatId::new(row.chat_id),
                row.product_ids.into_iter().map(ProductId::new).collect(),
            )
        })
        .collect())
}
