//! The watch flow: a persisted, multi-step state machine.
//!
//! The flow is re-entered once per inbound event; all resumption state
//! lives in the [`Session`](crate::session::Session) record. Planning
//! which transition applies is a pure function over (step, event), so
//! the state machine itself is unit-testable without storage; the
//! async [`WatchFlow`] driver executes the plan against the trait
//! seams.

use crate::error::ConversationError;
use crate::event::InboundEvent;
use crate::reply::{self, Button, CANCEL_VALUE, Reply};
use crate::session::SessionStore;
use crate::store::{ProductDirectory, ProductSummary, WatchList};
use rootcause::prelude::Report;
use version_sentry_core::{ChatId, ProductId};

/// Command name recorded in the session while the flow is active.
pub const COMMAND: &str = "watch";

/// Explicit states of the watch flow.
///
/// Persisted as the session's integer step so a crashed or restarted
/// process resumes exactly where the chat left off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Session just created; the next event emits the keyword prompt.
    Greeting,
    /// Waiting for a search keyword.
    AwaitingKeyword,
    /// Waiting for the user to pick one of the offered products.
    AwaitingSelection,
}

impl WatchState {
    /// Maps a persisted step integer back to a state.
    #[must_use]
    pub fn from_step(step: i16) -> Option<Self> {
        match step {
            1 => Some(Self::Greeting),
            2 => Some(Self::AwaitingKeyword),
            3 => Some(Self::AwaitingSelection),
            _ => None,
        }
    }

    /// The step integer persisted for this state.
    #[must_use]
    pub fn step(self) -> i16 {
        match self {
            Self::Greeting => 1,
            Self::AwaitingKeyword => 2,
            Self::AwaitingSelection => 3,
        }
    }
}

/// The transition selected for one (step, event) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepPlan {
    /// Emit the keyword prompt and advance to `AwaitingKeyword`.
    Prompt,
    /// Delete the session and confirm cancellation.
    Cancel,
    /// Search the catalog for the keyword.
    Search { keyword: String },
    /// Text arrived where a selection was required; abort the flow.
    RejectText,
    /// A product was selected; resolve and subscribe.
    Resolve { value: String },
    /// The persisted step is outside the known set.
    Unhandled { step: i16 },
}

/// Pure transition planning: which action does this event trigger at
/// this step?
#[must_use]
pub fn plan(step: i16, event: &InboundEvent) -> StepPlan {
    match (WatchState::from_step(step), event) {
        // First pass always prompts, whatever the event was.
        (Some(WatchState::Greeting), _) => StepPlan::Prompt,

        (Some(WatchState::AwaitingKeyword), InboundEvent::Selection { value, .. }) => {
            if value == CANCEL_VALUE {
                StepPlan::Cancel
            } else {
                // A stray callback mid-search: treat its value as the keyword.
                StepPlan::Search {
                    keyword: value.clone(),
                }
            }
        }
        (Some(WatchState::AwaitingKeyword), InboundEvent::Text { text, .. }) => StepPlan::Search {
            keyword: text.clone(),
        },

        (Some(WatchState::AwaitingSelection), InboundEvent::Selection { value, .. }) => {
            if value == CANCEL_VALUE {
                StepPlan::Cancel
            } else {
                StepPlan::Resolve {
                    value: value.clone(),
                }
            }
        }
        (Some(WatchState::AwaitingSelection), InboundEvent::Text { .. }) => StepPlan::RejectText,

        (None, _) => StepPlan::Unhandled { step },
    }
}

/// Drives the watch flow against the storage seams.
pub struct WatchFlow<'a> {
    sessions: &'a dyn SessionStore,
    products: &'a dyn ProductDirectory,
    watch_list: &'a dyn WatchList,
}

impl<'a> WatchFlow<'a> {
    /// Creates a flow over the given stores.
    #[must_use]
    pub fn new(
        sessions: &'a dyn SessionStore,
        products: &'a dyn ProductDirectory,
        watch_list: &'a dyn WatchList,
    ) -> Self {
        Self {
            sessions,
            products,
            watch_list,
        }
    }

    /// Handles one inbound event routed to the watch command.
    pub async fn handle(&self, event: &InboundEvent) -> Result<Reply, Report<ConversationError>> {
        let chat_id = event.chat_id();

        let session = match self.sessions.get(chat_id).await? {
            Some(session) => session,
            None => {
                self.sessions
                    .set(chat_id, COMMAND, WatchState::Greeting.step(), None)
                    .await?
            }
        };

        match plan(session.step, event) {
            StepPlan::Prompt => {
                self.sessions
                    .set(chat_id, COMMAND, WatchState::AwaitingKeyword.step(), None)
                    .await?;
                Ok(prompt_reply(chat_id))
            }

            StepPlan::Cancel => {
                self.sessions.delete(chat_id).await?;
                Ok(cancelled_reply(event))
            }

            StepPlan::Search { keyword } => {
                let matches = self.products.search(&keyword).await?;
                if matches.is_empty() {
                    // Intentionally stays at AwaitingKeyword: the user
                    // either refines the query or cancels.
                    return Ok(no_matches_reply(chat_id));
                }
                self.sessions
                    .set(chat_id, COMMAND, WatchState::AwaitingSelection.step(), None)
                    .await?;
                Ok(choose_reply(chat_id, &matches))
            }

            StepPlan::RejectText => {
                self.sessions.delete(chat_id).await?;
                Ok(Reply::message(chat_id, reply::italic("Invalid command")))
            }

            StepPlan::Resolve { value } => {
                let product_id: ProductId = value
                    .parse()
                    .map_err(|_| ConversationError::InvalidSelection {
                        value: value.clone(),
                    })?;
                let product = self
                    .products
                    .get(product_id)
                    .await?
                    .ok_or(ConversationError::UnknownProduct { id: product_id })?;

                if self.watch_list.contains(chat_id, product.id).await? {
                    self.sessions.delete(chat_id).await?;
                    return Ok(already_watched_reply(event, &product));
                }

                self.watch_list.add(chat_id, product.id).await?;
                self.sessions.delete(chat_id).await?;
                Ok(added_reply(event, &product))
            }

            StepPlan::Unhandled { step } => {
                tracing::warn!(chat_id = %chat_id, step, "session at unhandled step");
                // Session is left untouched; explicit cancellation recovers.
                Ok(Reply::message(chat_id, reply::italic("Unhandled step")))
            }
        }
    }
}

fn prompt_reply(chat_id: ChatId) -> Reply {
    let text = format!(
        "{}\n\n{}",
        reply::italic("Type what you want to watch..."),
        reply::italic("E.g. \"Ubuntu\", \"nginx\""),
    );
    Reply::message(chat_id, text).with_cancel_row()
}

fn no_matches_reply(chat_id: ChatId) -> Reply {
    Reply::message(
        chat_id,
        reply::italic("No products found. Type another keyword..."),
    )
    .with_cancel_row()
}

fn choose_reply(chat_id: ChatId, matches: &[ProductSummary]) -> Reply {
    let mut keyboard: Vec<Vec<Button>> = matches
        .iter()
        .map(|product| vec![Button::new(product.name.clone(), product.id.to_string())])
        .collect();
    keyboard.push(vec![Button::cancel()]);
    Reply::message(chat_id, "Choose a product:").with_keyboard(keyboard)
}

fn cancelled_reply(event: &InboundEvent) -> Reply {
    Reply::edit(
        event.chat_id(),
        event.message_id(),
        reply::italic("Cancelled"),
    )
}

fn already_watched_reply(event: &InboundEvent, product: &ProductSummary) -> Reply {
    let text = reply::italic(&format!(
        "❌ {} is already in the list",
        reply::escape(&product.name.to_uppercase())
    ));
    Reply::edit(event.chat_id(), event.message_id(), text)
}

fn added_reply(event: &InboundEvent, product: &ProductSummary) -> Reply {
    let text = format!(
        "{}\n\n{}",
        reply::italic(&format!(
            "✅ {} added to the list",
            reply::escape(&product.name.to_uppercase())
        )),
        reply::italic("*You'll be notified when a new version is released"),
    );
    Reply::edit(event.chat_id(), event.message_id(), text)
}
