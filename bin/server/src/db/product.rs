//! Product and version persistence.
//!
//! The repository serves the conversation's read access; the free
//! functions are the sync and notification job queries. Sync writes go
//! through a caller-owned transaction so one run commits atomically.

use crate::db::storage_error;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rootcause::prelude::Report;
use sqlx::{FromRow, PgConnection, PgPool};
use version_sentry_conversation::{
    ConversationError, ProductDirectory, ProductSummary, ReleaseLine,
};
use version_sentry_core::ProductId;
use version_sentry_feed::{CatalogEntry, VersionEntry};

/// Repository for conversation-side product reads.
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

#[derive(FromRow)]
struct ProductRow {
    id: i64,
    name: String,
}

impl ProductRow {
    fn into_summary(self) -> ProductSummary {
        ProductSummary {
            id: ProductId::new(self.id),
            name: self.name,
        }
    }
}

impl ProductRepository {
    /// Creates a new product repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductDirectory for ProductRepository {
    async fn search(
        &self,
        keyword: &str,
    ) -> Result<Vec<ProductSummary>, Report<ConversationError>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name
            FROM product
            WHERE name ILIKE '%' || $1 || '%'
            ORDER BY name
            "#,
        )
        .bind(keyword)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(ProductRow::into_summary).collect())
    }

    async fn get(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductSummary>, Report<ConversationError>> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name
            FROM product
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(ProductRow::into_summary))
    }
}

/// Upserts one catalog entry by its natural key.
///
/// Conflicts overwrite url/sha/size and stamp updated_at; created_at
/// is only ever set on first insert.
pub async fn upsert_catalog_entry(
    conn: &mut PgConnection,
    entry: &CatalogEntry,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO product (name, url, sha, size, created_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (name) DO UPDATE
        SET url = EXCLUDED.url,
            sha = EXCLUDED.sha,
            size = EXCLUDED.size,
            updated_at = $5
        "#,
    )
    .bind(&entry.name)
    .bind(&entry.url)
    .bind(&entry.sha)
    .bind(entry.size)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

/// Inserts fetched versions, skipping any (version, product) pair
/// already recorded. Version history is immutable once written.
pub async fn insert_versions(
    conn: &mut PgConnection,
    product_id: ProductId,
    versions: &[VersionEntry],
    stamped_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    for version in versions {
        sqlx::query(
            r#"
            INSERT INTO product_version (product_id, version, release_date, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (version, product_id) DO NOTHING
            "#,
        )
        .bind(product_id.as_i64())
        .bind(&version.version)
        .bind(version.release_date)
        .bind(stamped_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Distinct products that gained at least one version row in the run
/// stamped with the given timestamp.
pub async fn updated_product_ids(
    pool: &PgPool,
    stamped_at: DateTime<Utc>,
) -> Result<Vec<ProductId>, sqlx::Error> {
    let ids: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT product_id
        FROM product_version
        WHERE created_at = $1
        "#,
    )
    .bind(stamped_at)
    .fetch_all(pool)
    .await?;

    Ok(ids.into_iter().map(ProductId::new).collect())
}

/// A product's name and the versions it gained in one run.
#[derive(Debug, Clone)]
pub struct ProductDigest {
    pub id: ProductId,
    pub name: String,
    pub releases: Vec<ReleaseLine>,
}

#[derive(FromRow)]
struct ReleaseRow {
    version: String,
    release_date: NaiveDate,
}

/// Loads the digest for one updated product: its most recent versions
/// created in the given run, newest first, bounded.
pub async fn product_digest(
    pool: &PgPool,
    product_id: ProductId,
    stamped_at: DateTime<Utc>,
    limit: i64,
) -> Result<ProductDigest, sqlx::Error> {
    let name: String = sqlx::query_scalar(
        r#"
        SELECT name
        FROM product
        WHERE id = $1
        "#,
    )
    .bind(product_id.as_i64())
    .fetch_one(pool)
    .await?;

    let rows: Vec<ReleaseRow> = sqlx::query_as(
        r#"
        SELECT version, release_date
        FROM product_version
        WHERE product_id = $1 AND created_at = $2
        ORDER BY release_date DESC
        LIMIT $3
        "#,
    )
    .bind(product_id.as_i64())
    .bind(stamped_at)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(ProductDigest {
        id: product_id,
        name,
        releases: rows
            .into_iter()
            .map(|row| ReleaseLine {
                version: row.version,
                release_date: row.release_date,
            })
            .collect(),
    })
}
