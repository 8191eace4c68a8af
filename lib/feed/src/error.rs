//! Error types for the feed crate.

use std::fmt;

/// Errors from upstream feed operations.
///
/// Any of these aborts the sync run that triggered the fetch; a stale
/// complete catalog is preferred over a fresh incomplete one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The request could not be sent or the response not read.
    RequestFailed { details: String },
    /// The upstream answered with a non-success status.
    Status { status: u16, url: String },
    /// The response body did not match the expected document shape.
    Decode { details: String },
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { details } => {
                write!(f, "feed request failed: {details}")
            }
            Self::Status { status, url } => {
                write!(f, "feed returned HTTP {status} for {url}")
            }
            Self::Decode { details } => {
                write!(f, "feed response malformed: {details}")
            }
        }
    }
}

impl std::error::Error for FeedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = FeedError::Status {
            status: 403,
            url: "https://example.test/releases".to_string(),
        };
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("releases"));
    }
}
