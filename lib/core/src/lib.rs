//! Core domain types and utilities for the version-sentry platform.
//!
//! This crate provides the foundational types and error handling used
//! throughout the version-sentry release watcher.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ChatId, MessageId, ParseIdError, ProductId};
