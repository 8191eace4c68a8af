//! Upstream document shapes and their normalized forms.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One trackable product as advertised by the upstream catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Product name; the upstream file name without its `.json` suffix.
    pub name: String,
    /// Source URL of the product's version document.
    pub url: String,
    /// Content fingerprint of the version document.
    pub sha: String,
    /// Size of the version document in bytes.
    pub size: i64,
}

/// One released version of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: String,
    pub release_date: NaiveDate,
}

/// Raw entry of the upstream directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RawContentEntry {
    pub name: String,
    pub url: String,
    pub sha: String,
    pub size: i64,
}

/// Raw per-product version document.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionDocument {
    /// Version-key to release record. BTreeMap keeps iteration stable.
    pub versions: BTreeMap<String, RawVersion>,
}

/// One release record inside a version document.
#[derive(Debug, Clone, Deserialize)]
pub struct RawVersion {
    /// The version string.
    pub name: String,
    /// Release date, ISO formatted.
    pub date: NaiveDate,
}

/// Normalizes the raw directory listing into catalog entries.
#[must_use]
pub fn catalog_entries(raw: Vec<RawContentEntry>) -> Vec<CatalogEntry> {
    raw.into_iter()
        .map(|entry| CatalogEntry {
            name: entry
                .name
                .strip_suffix(".json")
                .unwrap_or(&entry.name)
                .to_string(),
            url: entry.url,
            sha: entry.sha,
            size: entry.size,
        })
        .collect()
}

/// Flattens a version document into version entries.
#[must_use]
pub fn version_entries(document: VersionDocument) -> Vec<VersionEntry> {
    document
        .versions
        .into_values()
        .map(|version| VersionEntry {
            version: version.name,
            release_date: version.date,
        })
        .collect()
}
