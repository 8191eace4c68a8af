//! Catalog sync.
//!
//! A run first gathers everything it intends to write: the catalog
//! listing, then the version history of every watched product fetched
//! sequentially with a throttle. The finished batch goes to storage in
//! one transaction. A feed failure therefore aborts before a single
//! write; the previous catalog stays intact. Every row of the batch
//! carries the run's shared timestamp, which is how the notification
//! dispatch later finds what this run added.
//!
//! The watched set is read before the catalog lands. A product first
//! appearing in this run cannot have subscribers yet, so nothing is
//! missed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use version_sentry_core::ProductId;
use version_sentry_feed::{CatalogEntry, ReleaseFeed, VersionEntry};

/// Failure during a sync run.
#[derive(Debug)]
pub enum SyncError {
    /// The upstream feed could not be read.
    Feed { details: String },
    /// A database statement failed; the whole run rolls back.
    Database { details: String },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feed { details } => write!(f, "upstream feed failure: {details}"),
            Self::Database { details } => write!(f, "database failure: {details}"),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<sqlx::Error> for SyncError {
    fn from(error: sqlx::Error) -> Self {
        Self::Database {
            details: error.to_string(),
        }
    }
}

/// A product with at least one subscriber, and its source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedSource {
    pub id: ProductId,
    pub url: String,
}

/// Everything one sync run intends to write, stamped with the run's
/// shared timestamp.
#[derive(Debug, Clone)]
pub struct SyncBatch {
    pub stamped_at: DateTime<Utc>,
    pub catalog: Vec<CatalogEntry>,
    pub versions: Vec<(ProductId, Vec<VersionEntry>)>,
}

/// Storage side of a sync run.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// The distinct products worth a version fetch: those with at
    /// least one active subscription.
    async fn watched_sources(&self) -> Result<Vec<WatchedSource>, Report<SyncError>>;

    /// Commits the whole batch atomically.
    async fn apply(&self, batch: &SyncBatch) -> Result<(), Report<SyncError>>;
}

/// The catalog sync job.
pub struct CatalogSync {
    store: Arc<dyn SyncStore>,
    feed: Arc<dyn ReleaseFeed>,
    fetch_delay: Duration,
}

impl CatalogSync {
    /// Creates a sync job over the given feed and store.
    pub fn new(store: Arc<dyn SyncStore>, feed: Arc<dyn ReleaseFeed>, fetch_delay: Duration) -> Self {
        Self {
            store,
            feed,
            fetch_delay,
        }
    }

    /// Runs one sync and returns the timestamp stamped on every row
    /// the run created. All writes land together or not at all.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<DateTime<Utc>, Report<SyncError>> {
        let stamped_at = Utc::now();

        let catalog = self
            .feed
            .catalog()
            .await
            .map_err(|e| SyncError::Feed {
                details: e.to_string(),
            })?;

        let watched = self.store.watched_sources().await?;

        let mut versions = Vec::with_capacity(watched.len());
        for source in &watched {
            // Serialized against the upstream rate limit.
            tokio::time::sleep(self.fetch_delay).await;

            let fetched = self
                .feed
                .versions(&source.url)
                .await
                .map_err(|e| SyncError::Feed {
                    details: e.to_string(),
                })?;
            versions.push((source.id, fetched));
        }

        tracing::info!(
            products = catalog.len(),
            watched = watched.len(),
            %stamped_at,
            "sync batch gathered"
        );

        let batch = SyncBatch {
            stamped_at,
            catalog,
            versions,
        };
        self.store.apply(&batch).await?;
        tracing::info!(%stamped_at, "sync run committed");

        Ok(stamped_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use version_sentry_feed::FeedError;

    struct ScriptedFeed {
        catalog: Result<Vec<CatalogEntry>, u16>,
        versions_by_url: HashMap<String, Vec<VersionEntry>>,
        fetched: Mutex<Vec<String>>,
    }

    impl ScriptedFeed {
        fn new(catalog: Vec<CatalogEntry>) -> Self {
            Self {
                catalog: Ok(catalog),
                versions_by_url: HashMap::new(),
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn failing_catalog(status: u16) -> Self {
            Self {
                catalog: Err(status),
                versions_by_url: HashMap::new(),
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn with_versions(mut self, url: &str, versions: Vec<VersionEntry>) -> Self {
            self.versions_by_url.insert(url.to_string(), versions);
            self
        }
    }

    #[async_trait]
    impl ReleaseFeed for ScriptedFeed {
        async fn catalog(&self) -> Result<Vec<CatalogEntry>, Report<FeedError>> {
            match &self.catalog {
                Ok(entries) => Ok(entries.clone()),
                Err(status) => Err(FeedError::Status {
                    status: *status,
                    url: "https://feed.test/releases".to_string(),
                }
                .into()),
            }
        }

        async fn versions(&self, url: &str) -> Result<Vec<VersionEntry>, Report<FeedError>> {
            self.fetched.lock().unwrap().push(url.to_string());
            match self.versions_by_url.get(url) {
                Some(versions) => Ok(versions.clone()),
                None => Err(FeedError::Status {
                    status: 500,
                    url: url.to_string(),
                }
                .into()),
            }
        }
    }

    struct MemorySyncStore {
        watched: Vec<WatchedSource>,
        applied: Mutex<Vec<SyncBatch>>,
    }

    impl MemorySyncStore {
        fn new(watched: Vec<WatchedSource>) -> Self {
            Self {
                watched,
                applied: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SyncStore for MemorySyncStore {
        async fn watched_sources(&self) -> Result<Vec<WatchedSource>, Report<SyncError>> {
            Ok(self.watched.clone())
        }

        async fn apply(&self, batch: &SyncBatch) -> Result<(), Report<SyncError>> {
            self.applied.lock().unwrap().push(batch.clone());
            Ok(())
        }
    }

    fn entry(name: &str) -> CatalogEntry {
        CatalogEntry {
            name: name.to_string(),
            url: format!("https://feed.test/{name}"),
            sha: format!("sha-{name}"),
            size: 1024,
        }
    }

    fn source(id: i64, name: &str) -> WatchedSource {
        WatchedSource {
            id: ProductId::new(id),
            url: format!("https://feed.test/{name}"),
        }
    }

    fn version(name: &str, date: &str) -> VersionEntry {
        VersionEntry {
            version: name.to_string(),
            release_date: date.parse::<NaiveDate>().unwrap(),
        }
    }

    fn sync(store: Arc<MemorySyncStore>, feed: Arc<ScriptedFeed>) -> CatalogSync {
        CatalogSync::new(store, feed, Duration::ZERO)
    }

    #[tokio::test]
    async fn run_applies_one_batch_with_a_single_stamp() {
        let feed = Arc::new(
            ScriptedFeed::new(vec![entry("ubuntu"), entry("nginx")])
                .with_versions("https://feed.test/ubuntu", vec![version("24.04", "2024-04-25")]),
        );
        let store = Arc::new(MemorySyncStore::new(vec![source(1, "ubuntu")]));

        let stamped_at = sync(store.clone(), feed).run().await.unwrap();

        let applied = store.applied.lock().unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].stamped_at, stamped_at);
        assert_eq!(applied[0].catalog.len(), 2);
        assert_eq!(
            applied[0].versions,
            vec![(ProductId::new(1), vec![version("24.04", "2024-04-25")])]
        );
    }

    #[tokio::test]
    async fn unwatched_products_are_never_fetched() {
        let feed = Arc::new(
            ScriptedFeed::new(vec![entry("ubuntu"), entry("nginx"), entry("postgres")])
                .with_versions("https://feed.test/ubuntu", vec![]),
        );
        let store = Arc::new(MemorySyncStore::new(vec![source(1, "ubuntu")]));

        sync(store, feed.clone()).run().await.unwrap();

        assert_eq!(
            *feed.fetched.lock().unwrap(),
            vec!["https://feed.test/ubuntu".to_string()]
        );
    }

    #[tokio::test]
    async fn version_fetch_failure_aborts_with_nothing_applied() {
        // Third of three watched products fails; the two earlier
        // successful fetches must not become visible.
        let feed = Arc::new(
            ScriptedFeed::new(vec![entry("ubuntu"), entry("nginx"), entry("postgres")])
                .with_versions("https://feed.test/ubuntu", vec![version("24.04", "2024-04-25")])
                .with_versions("https://feed.test/nginx", vec![version("1.27.1", "2025-07-01")]),
        );
        let store = Arc::new(MemorySyncStore::new(vec![
            source(1, "ubuntu"),
            source(2, "nginx"),
            source(3, "postgres"),
        ]));

        let result = sync(store.clone(), feed.clone()).run().await;

        assert!(result.is_err());
        assert!(store.applied.lock().unwrap().is_empty());
        assert_eq!(feed.fetched.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn catalog_failure_leaves_store_untouched() {
        let feed = Arc::new(ScriptedFeed::failing_catalog(403));
        let store = Arc::new(MemorySyncStore::new(vec![source(1, "ubuntu")]));

        let result = sync(store.clone(), feed.clone()).run().await;

        assert!(result.is_err());
        assert!(store.applied.lock().unwrap().is_empty());
        assert!(feed.fetched.lock().unwrap().is_empty());
    }
}
