//! Single-shot commands: start, chat id, watch list, unwatch.
//!
//! None of these create a session; each produces its reply in one
//! pass.

use crate::error::ConversationError;
use crate::event::ChatProfile;
use crate::reply::{self, Reply};
use crate::store::{ChatDirectory, WatchList, WatchedProduct};
use rootcause::prelude::Report;
use version_sentry_core::ChatId;

/// Registers the chat and greets the user.
pub async fn start(
    chats: &dyn ChatDirectory,
    chat_id: ChatId,
    profile: &ChatProfile,
    app_name: &str,
) -> Result<Reply, Report<ConversationError>> {
    chats.register(chat_id, profile).await?;
    Ok(Reply::message(
        chat_id,
        format!("Welcome to {app_name}. Type what you need, e.g. /watch."),
    ))
}

/// Echoes the numeric chat identifier.
#[must_use]
pub fn chat_id(chat_id: ChatId) -> Reply {
    Reply::message(
        chat_id,
        format!("Your chat ID: {}", reply::code(&chat_id.to_string())),
    )
}

/// Lists the chat's watched products with their recent releases.
pub async fn watch_list(
    watch_list: &dyn WatchList,
    chat_id: ChatId,
) -> Result<Reply, Report<ConversationError>> {
    let watched = watch_list.overview(chat_id).await?;
    Ok(Reply::message(chat_id, render_watch_list(&watched)))
}

/// Lists watched products as removal commands.
pub async fn unwatch_overview(
    watch_list: &dyn WatchList,
    chat_id: ChatId,
) -> Result<Reply, Report<ConversationError>> {
    let watched = watch_list.overview(chat_id).await?;
    Ok(Reply::message(chat_id, render_unwatch_list(&watched)))
}

/// Removes one product from the chat's watch list.
///
/// The command suffix uses underscores where the product name has
/// hyphens, because underscores survive chat clients' command parsing.
pub async fn unwatch_product(
    watch_list: &dyn WatchList,
    chat_id: ChatId,
    command_suffix: &str,
) -> Result<Reply, Report<ConversationError>> {
    let product_name = command_suffix.replace('_', "-");
    match watch_list.remove(chat_id, &product_name).await? {
        Some(name) => Ok(Reply::message(
            chat_id,
            reply::italic(&format!(
                "✅ {} removed from the list",
                reply::escape(&name.to_uppercase())
            )),
        )),
        None => Ok(Reply::message(
            chat_id,
            reply::italic("Product not found in your list"),
        )),
    }
}

fn render_watch_list(watched: &[WatchedProduct]) -> String {
    let mut text = format!("{}\n\n", reply::bold("Watch List"));
    if watched.is_empty() {
        text.push_str(&reply::italic("No products added to the list"));
        return text;
    }

    let blocks: Vec<String> = watched
        .iter()
        .map(|product| {
            let heading = reply::bold(&reply::escape(&product.name.to_uppercase()));
            let lines: Vec<String> = product
                .recent
                .iter()
                .map(|release| {
                    format!(
                        "version: {} - release: {}",
                        reply::code(&reply::escape(&release.version)),
                        release.release_date,
                    )
                })
                .collect();
            format!("{heading}\n{}", lines.join("\n"))
        })
        .collect();
    text.push_str(&blocks.join("\n\n"));
    text
}

fn render_unwatch_list(watched: &[WatchedProduct]) -> String {
    let mut text = format!("{}\n\n", reply::bold("Watch List"));
    if watched.is_empty() {
        text.push_str(&reply::italic("No products added to the list"));
        return text;
    }

    let lines: Vec<String> = watched
        .iter()
        .map(|product| {
            format!(
                "• {} - /unwatch_{}",
                reply::escape(&product.name.to_uppercase()),
                product.name.replace('-', "_"),
            )
        })
        .collect();
    text.push_str(&lines.join("\n"));
    text
}
