//! Upstream release feed access for the version-sentry platform.
//!
//! This crate provides:
//!
//! - **Types**: The upstream catalog and version document shapes
//! - **Client**: The authenticated HTTP client behind the
//!   [`ReleaseFeed`] trait

pub mod client;
pub mod error;
pub mod types;

pub use client::{ReleaseDataClient, ReleaseFeed};
pub use error::FeedError;
pub use types::{CatalogEntry, VersionEntry};
