//! Storage side of the catalog sync.
//!
//! Applying a batch is the one place product and version rows get
//! written; the whole batch goes through a single transaction.

use crate::db::product::{insert_versions, upsert_catalog_entry};
use crate::jobs::sync::{SyncBatch, SyncError, SyncStore, WatchedSource};
use async_trait::async_trait;
use rootcause::prelude::Report;
use sqlx::{FromRow, PgPool};
use version_sentry_core::ProductId;

/// Repository backing sync runs.
#[derive(Clone)]
pub struct SyncRepository {
    pool: PgPool,
}

impl SyncRepository {
    /// Creates a new sync repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SourceRow {
    id: i64,
    url: String,
}

#[async_trait]
impl SyncStore for SyncRepository {
    async fn watched_sources(&self) -> Result<Vec<WatchedSource>, Report<SyncError>> {
        let rows: Vec<SourceRow> = sqlx::query_as(
            r#"
            SELECT DISTINCT p.id, p.url
            FROM product p
            INNER JOIN subscription s ON s.product_id = p.id
            ORDER BY p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(SyncError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| WatchedSource {
                id: ProductId::new(row.id),
                url: row.url,
            })
            .collect())
    }

    async fn apply(&self, batch: &SyncBatch) -> Result<(), Report<SyncError>> {
        let mut tx = self.pool.begin().await.map_err(SyncError::from)?;

        for entry in &batch.catalog {
            upsert_catalog_entry(&mut *tx, entry, batch.stamped_at)
                .await
                .map_err(SyncError::from)?;
        }
        for (product_id, versions) in &batch.versions {
            insert_versions(&mut *tx, *product_id, versions, batch.stamped_at)
                .await
                .map_err(SyncError::from)?;
        }

        tx.commit().await.map_err(SyncError::from)?;
        Ok(())
    }
}
