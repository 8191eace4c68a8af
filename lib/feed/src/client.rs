//! HTTP client for the upstream release-data feed.
//!
//! The catalog is one directory listing; each product's version
//! history is a separate JSON document at the product's source URL.
//! Both are fetched with the raw-content accept header so the bodies
//! arrive as plain JSON.

use crate::error::FeedError;
use crate::types::{CatalogEntry, RawContentEntry, VersionDocument, VersionEntry, catalog_entries, version_entries};
use async_trait::async_trait;
use rootcause::prelude::Report;
use tracing::instrument;

/// Directory listing of the upstream release-data repository.
const CATALOG_URL: &str =
    "https://api.github.com/repos/endoflife-date/release-data/contents/releases";

/// Read access to the upstream feed.
#[async_trait]
pub trait ReleaseFeed: Send + Sync {
    /// Fetches the full product catalog in one call.
    async fn catalog(&self) -> Result<Vec<CatalogEntry>, Report<FeedError>>;

    /// Fetches one product's version history from its source URL.
    async fn versions(&self, url: &str) -> Result<Vec<VersionEntry>, Report<FeedError>>;
}

/// Authenticated client for the GitHub-hosted release-data feed.
pub struct ReleaseDataClient {
    http: reqwest::Client,
    token: String,
    catalog_url: String,
}

impl ReleaseDataClient {
    /// Creates a client authenticated with the given API token.
    pub fn new(token: impl Into<String>) -> Result<Self, Report<FeedError>> {
        let http = reqwest::Client::builder()
            .user_agent("version-sentry")
            .build()
            .map_err(|e| FeedError::RequestFailed {
                details: e.to_string(),
            })?;
        Ok(Self {
            http,
            token: token.into(),
            catalog_url: CATALOG_URL.to_string(),
        })
    }

    /// Overrides the catalog URL. Intended for tests.
    #[must_use]
    pub fn with_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = url.into();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, Report<FeedError>> {
        let response = self
            .http
            .get(url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.raw+json")
            .send()
            .await
            .map_err(|e| FeedError::RequestFailed {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into());
        }

        response.json::<T>().await.map_err(|e| {
            FeedError::Decode {
                details: e.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl ReleaseFeed for ReleaseDataClient {
    #[instrument(skip(self))]
    async fn catalog(&self) -> Result<Vec<CatalogEntry>, Report<FeedError>> {
        let raw: Vec<RawContentEntry> = self.get_json(&self.catalog_url).await?;
        let entries = catalog_entries(raw);
        tracing::debug!(products = entries.len(), "fetched upstream catalog");
        Ok(entries)
    }

    #[instrument(skip(self))]
    async fn versions(&self, url: &str) -> Result<Vec<VersionEntry>, Report<FeedError>> {
        let document: VersionDocument = self.get_json(url).await?;
        Ok(version_entries(document))
    }
}
