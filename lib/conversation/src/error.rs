//! Error types for the conversation crate.
//!
//! Errors are designed for layered context using rootcause:
//! storage adapters convert their backend failures into
//! `ConversationError::StorageFailed` before the error crosses the
//! trait seam.

use std::fmt;
use version_sentry_core::ProductId;

/// Errors from conversation handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// A storage operation failed.
    StorageFailed { details: String },
    /// A selection callback referenced a product that does not exist.
    UnknownProduct { id: ProductId },
    /// A selection callback carried a value that is neither a product
    /// id nor the cancel sentinel.
    InvalidSelection { value: String },
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorageFailed { details } => {
                write!(f, "conversation storage failed: {details}")
            }
            Self::UnknownProduct { id } => {
                write!(f, "unknown product: {id}")
            }
            Self::InvalidSelection { value } => {
                write!(f, "invalid selection value: '{value}'")
            }
        }
    }
}

impl std::error::Error for ConversationError {}
