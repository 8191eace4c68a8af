//! Conversation engine for the version-sentry platform.
//!
//! This crate provides:
//!
//! - **Events & Replies**: The normalized inbound/outbound shapes the
//!   core exchanges with the transport layer
//! - **Session Store**: The contract for persisted multi-step flows
//! - **Watch Flow**: The multi-step subscribe state machine
//! - **Router**: Outer command dispatch, including the reserved
//!   "cancel" literal and session-command priority

pub mod commands;
pub mod error;
pub mod event;
pub mod reply;
pub mod router;
pub mod session;
pub mod store;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::ConversationError;
pub use event::{ChatProfile, InboundEvent};
pub use reply::{Button, CANCEL_VALUE, Reply, ReplyMode};
pub use router::{Router, normalize_command};
pub use session::{Session, SessionStore};
pub use store::{ChatDirectory, ProductDirectory, ProductSummary, ReleaseLine, WatchList, WatchedProduct};
pub use watch::{StepPlan, WatchFlow, WatchState};
