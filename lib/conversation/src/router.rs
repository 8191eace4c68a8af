//! Outer command routing.
//!
//! Routing is itself a small state machine: when a session exists, its
//! recorded command takes priority over whatever the user just typed,
//! so a chat mid-flow stays inside the flow. The reserved literal
//! "cancel" always terminates an active session from here, before any
//! command dispatch.

use crate::commands;
use crate::error::ConversationError;
use crate::event::InboundEvent;
use crate::reply::{self, Reply};
use crate::session::SessionStore;
use crate::store::{ChatDirectory, ProductDirectory, WatchList};
use crate::watch::WatchFlow;
use rootcause::prelude::Report;
use version_sentry_core::ChatId;

/// Longest command text considered; anything longer cannot be a
/// command.
const MAX_COMMAND_LEN: usize = 30;

/// Routes inbound events to command handlers.
pub struct Router<'a> {
    sessions: &'a dyn SessionStore,
    products: &'a dyn ProductDirectory,
    watch_list: &'a dyn WatchList,
    chats: &'a dyn ChatDirectory,
    app_name: &'a str,
}

impl<'a> Router<'a> {
    /// Creates a router over the given stores.
    #[must_use]
    pub fn new(
        sessions: &'a dyn SessionStore,
        products: &'a dyn ProductDirectory,
        watch_list: &'a dyn WatchList,
        chats: &'a dyn ChatDirectory,
        app_name: &'a str,
    ) -> Self {
        Self {
            sessions,
            products,
            watch_list,
            chats,
            app_name,
        }
    }

    /// Handles one inbound event and produces the outbound reply.
    pub async fn route(&self, event: &InboundEvent) -> Result<Reply, Report<ConversationError>> {
        let chat_id = event.chat_id();

        let mut command = match event {
            InboundEvent::Text { text, .. } => normalize_command(text),
            InboundEvent::Selection { .. } => String::new(),
        };

        // Reserved: "cancel" terminates any active flow from out here.
        if command == "cancel" {
            self.sessions.delete(chat_id).await?;
            return Ok(Reply::message(chat_id, reply::italic("Cancelled")));
        }

        // A chat mid-flow is kept inside the flow regardless of input.
        if let Some(session) = self.sessions.get(chat_id).await? {
            command = session.command;
        }

        match command.as_str() {
            "start" => {
                if let InboundEvent::Text { profile, .. } = event {
                    return commands::start(self.chats, chat_id, profile, self.app_name).await;
                }
                self.invalid_session(event).await
            }
            "chatid" | "chat id" => Ok(commands::chat_id(chat_id)),
            "watch" => {
                WatchFlow::new(self.sessions, self.products, self.watch_list)
                    .handle(event)
                    .await
            }
            "watchlist" | "watch list" => commands::watch_list(self.watch_list, chat_id).await,
            "unwatch" => commands::unwatch_overview(self.watch_list, chat_id).await,
            other => {
                if let Some(suffix) = other.strip_prefix("unwatch_") {
                    return commands::unwatch_product(self.watch_list, chat_id, suffix).await;
                }
                match event {
                    InboundEvent::Text { .. } => {
                        Ok(Reply::message(chat_id, reply::italic("Unknown command")))
                    }
                    InboundEvent::Selection { .. } => self.invalid_session(event).await,
                }
            }
        }
    }

    /// A reply for events that only text messages can carry.
    #[must_use]
    pub fn only_text_reply(chat_id: ChatId) -> Reply {
        Reply::message(chat_id, reply::italic("Only text messages are allowed"))
    }

    // A callback arrived with no routable session behind it; whatever
    // flow produced those buttons is gone.
    async fn invalid_session(
        &self,
        event: &InboundEvent,
    ) -> Result<Reply, Report<ConversationError>> {
        self.sessions.delete(event.chat_id()).await?;
        Ok(Reply::edit(
            event.chat_id(),
            event.message_id(),
            reply::italic("Invalid session"),
        ))
    }
}

/// Normalizes inbound text into a command word.
///
/// Lowercased, truncated, trimmed, leading slashes stripped: "/Watch"
/// and "watch" route identically.
#[must_use]
pub fn normalize_command(text: &str) -> String {
    let lowered = text.to_lowercase();
    let truncated: String = lowered.chars().take(MAX_COMMAND_LEN).collect();
    truncated.trim().trim_start_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ChatProfile;
    use crate::watch;
    use crate::reply::ReplyMode;
    use crate::store::ProductSummary;
    use crate::test_support::{MemoryCatalog, MemoryChats, MemorySessions, MemoryWatchList};
    use version_sentry_core::{MessageId, ProductId};

    #[test]
    fn normalize_strips_slash_and_case() {
        assert_eq!(normalize_command("/Watch"), "watch");
        assert_eq!(normalize_command("  /watch list "), "watch list");
        assert_eq!(normalize_command("/unwatch_ubuntu_lts"), "unwatch_ubuntu_lts");
    }

    #[test]
    fn normalize_truncates_long_text() {
        let long = "x".repeat(200);
        assert_eq!(normalize_command(&long).len(), MAX_COMMAND_LEN);
    }

    struct Fixture {
        sessions: MemorySessions,
        catalog: MemoryCatalog,
        watch_list: MemoryWatchList,
        chats: MemoryChats,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                sessions: MemorySessions::new(),
                catalog: MemoryCatalog::new(vec![ProductSummary {
                    id: ProductId::new(5),
                    name: "ubuntu-lts".to_string(),
                }]),
                watch_list: MemoryWatchList::new(),
                chats: MemoryChats::new(),
            }
        }

        fn router(&self) -> Router<'_> {
            Router::new(
                &self.sessions,
                &self.catalog,
                &self.watch_list,
                &self.chats,
                "Version Sentry",
            )
        }
    }

    fn text_event(chat: i64, text: &str) -> InboundEvent {
        InboundEvent::Text {
            chat_id: ChatId::new(chat),
            message_id: MessageId::new(10),
            text: text.to_string(),
            profile: ChatProfile::default(),
        }
    }

    fn selection_event(chat: i64, value: &str) -> InboundEvent {
        InboundEvent::Selection {
            chat_id: ChatId::new(chat),
            message_id: MessageId::new(10),
            value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn cancel_terminates_active_session() {
        let fixture = Fixture::new();
        fixture
            .sessions
            .force_step(ChatId::new(1), watch::COMMAND, 2)
            .await;

        let reply = fixture.router().route(&text_event(1, "cancel")).await.unwrap();
        assert!(reply.text.contains("Cancelled"));
        assert_eq!(fixture.sessions.step_of(ChatId::new(1)), None);
    }

    #[tokio::test]
    async fn session_command_overrides_inbound_text() {
        let fixture = Fixture::new();
        fixture
            .sessions
            .force_step(ChatId::new(1), watch::COMMAND, 2)
            .await;

        // "ubuntu" is not a command, but the chat is mid-watch-flow.
        let reply = fixture.router().route(&text_event(1, "ubuntu")).await.unwrap();
        assert_eq!(reply.text, "Choose a product:");
        assert_eq!(fixture.sessions.step_of(ChatId::new(1)), Some(3));
    }

    #[tokio::test]
    async fn unknown_text_gets_unknown_command() {
        let fixture = Fixture::new();
        let reply = fixture.router().route(&text_event(1, "frobnicate")).await.unwrap();
        assert!(reply.text.contains("Unknown command"));
    }

    #[tokio::test]
    async fn stray_callback_gets_invalid_session() {
        let fixture = Fixture::new();
        let reply = fixture
            .router()
            .route(&selection_event(1, "5"))
            .await
            .unwrap();
        assert!(reply.text.contains("Invalid session"));
        assert!(matches!(reply.mode, ReplyMode::EditMessage { .. }));
    }

    #[tokio::test]
    async fn start_registers_the_chat() {
        let fixture = Fixture::new();
        let reply = fixture.router().route(&text_event(42, "/start")).await.unwrap();
        assert!(reply.text.contains("Welcome to Version Sentry"));
        assert!(fixture.chats.is_registered(ChatId::new(42)));
    }

    #[tokio::test]
    async fn unwatch_prefix_removes_subscription() {
        let fixture = Fixture::new();
        fixture
            .watch_list
            .insert_named(ChatId::new(1), ProductId::new(5), "ubuntu-lts");

        let reply = fixture
            .router()
            .route(&text_event(1, "/unwatch_ubuntu_lts"))
            .await
            .unwrap();
        assert!(reply.text.contains("✅ UBUNTU-LTS removed from the list"));
        assert_eq!(fixture.watch_list.len(), 0);
    }

    #[tokio::test]
    async fn chat_id_echoes_identifier() {
        let fixture = Fixture::new();
        let reply = fixture.router().route(&text_event(77, "/chatid")).await.unwrap();
        assert!(reply.text.contains("<code>77</code>"));
    }
}
