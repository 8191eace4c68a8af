//! Strongly-typed ID types for domain entities.
//!
//! Chats and messages are identified by the numeric IDs Telegram assigns
//! them; products use the database-assigned serial ID. Wrapping the raw
//! `i64` keeps the three from being mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to generate a strongly-typed ID wrapper around an `i64`.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an ID from a raw numeric value.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the underlying numeric value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i64>().map(Self).map_err(|e| ParseIdError {
                    id_type: stringify!($name),
                    reason: e.to_string(),
                })
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a chat (conversation endpoint).
    ChatId
);

define_id!(
    /// Unique identifier for a trackable product.
    ProductId
);

define_id!(
    /// Identifier of a message within a chat, used to edit sent messages.
    MessageId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_id_display_format() {
        let id = ChatId::new(1234);
        assert_eq!(id.to_string(), "1234");
    }

    #[test]
    fn product_id_round_trips_through_string() {
        let id = ProductId::new(5);
        let parsed: ProductId = id.to_string().parse().expect("should parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_negative_chat_id() {
        // Telegram group chats have negative IDs.
        let parsed: ChatId = "-100123".parse().expect("should parse");
        assert_eq!(parsed.as_i64(), -100_123);
    }

    #[test]
    fn parse_invalid_id() {
        let result: Result<ProductId, _> = "cancel".parse();
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "ProductId");
    }
}
