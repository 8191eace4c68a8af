//! Postgres repositories behind the conversation trait seams, plus
//! the queries the sync and notification jobs run directly.

pub mod chat;
pub mod product;
pub mod session;
pub mod subscription;
pub mod sync;

pub use chat::ChatRepository;
pub use product::ProductRepository;
pub use session::SessionRepository;
pub use subscription::SubscriptionRepository;
pub use sync::SyncRepository;

use version_sentry_conversation::ConversationError;

/// Converts a database failure into the conversation-level error the
/// trait seams expect.
pub(crate) fn storage_error(error: sqlx::Error) -> ConversationError {
    ConversationError::StorageFailed {
        details: error.to_string(),
    }
}
