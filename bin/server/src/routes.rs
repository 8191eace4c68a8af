//! Webhook HTTP surface.
//!
//! The single webhook endpoint authenticates Telegram's secret-token
//! header, normalizes the update, routes it through the conversation
//! core, and answers with the bot method to execute. Processing
//! failures still answer 200 with a short status line, so Telegram
//! does not redeliver the update.

use crate::db::{ChatRepository, ProductRepository, SessionRepository, SubscriptionRepository};
use crate::types::{Normalized, TelegramUpdate, WebhookReply, normalize};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use sqlx::PgPool;
use std::sync::Arc;
use version_sentry_conversation::{InboundEvent, Reply, Router, reply};

/// Header Telegram echoes the configured webhook secret in.
const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Shared state for the webhook handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    sessions: SessionRepository,
    products: ProductRepository,
    watch_list: SubscriptionRepository,
    chats: ChatRepository,
    app_name: String,
    webhook_secret: String,
}

impl AppState {
    /// Builds the handler state over one connection pool.
    pub fn new(pool: PgPool, app_name: String, webhook_secret: String) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                sessions: SessionRepository::new(pool.clone()),
                products: ProductRepository::new(pool.clone()),
                watch_list: SubscriptionRepository::new(pool.clone()),
                chats: ChatRepository::new(pool),
                app_name,
                webhook_secret,
            }),
        }
    }
}

/// Builds the HTTP router.
pub fn router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/telegram-bot", post(webhook))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<TelegramUpdate>,
) -> Response {
    let authorized = headers
        .get(SECRET_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == state.inner.webhook_secret);
    if !authorized {
        tracing::warn!("webhook call with missing or wrong secret token");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let event = match normalize(update) {
        Normalized::Event(event) => event,
        Normalized::NonText { chat_id } => {
            return Json(WebhookReply::from(Router::only_text_reply(chat_id))).into_response();
        }
        Normalized::Ignored => return StatusCode::OK.into_response(),
    };

    let reply = route_event(&state, &event).await;
    Json(WebhookReply::from(reply)).into_response()
}

async fn route_event(state: &AppState, event: &InboundEvent) -> Reply {
    let inner = &state.inner;
    let router = Router::new(
        &inner.sessions,
        &inner.products,
        &inner.watch_list,
        &inner.chats,
        &inner.app_name,
    );

    match router.route(event).await {
        Ok(reply) => reply,
        Err(error) => {
            tracing::error!(chat_id = event.chat_id().as_i64(), %error, "routing failed");
            Reply::message(event.chat_id(), reply::italic("Internal server error"))
        }
    }
}
