//! Prefix plugin.
//!
//! `prefix` shows the chat's prefix. `prefix <value>` (admins only) sets it,
//! `prefix no_prefix` removes the need for a prefix, `prefix reset` goes
//! back to the default.

use std::future::Future;

use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};
use tracing::{error, warn};

use super::Invocation;
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::PrefixStore;
use crate::i18n::{format_text, get_text};
use crate::prefix::{PrefixService, PrefixUpdate};
use crate::utils::{html_escape, ReplyExt};

/// Outcome of a prefix command, before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixReply {
    /// Show this effective prefix.
    Current(String),
    /// Caller isn't allowed to change the prefix.
    MissingPermission,
    /// Change requested outside a group; carries the default prefix.
    PrivateChat(String),
    LoadFailed,
    SaveFailed,
}

/// Run the prefix command against `prefixes`.
///
/// `is_admin` is only awaited when a change is requested in a group.
pub async fn run_prefix_command<S, F, Fut>(
    prefixes: &PrefixService<S>,
    chat_id: Option<i64>,
    args: &str,
    is_admin: F,
) -> PrefixReply
where
    S: PrefixStore,
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    if args.is_empty() {
        return match prefixes.resolve_for(chat_id).await {
            Ok(prefix) => PrefixReply::Current(prefix),
            Err(e) => {
                error!("Failed to load prefix for chat {:?}: {}", chat_id, e);
                PrefixReply::LoadFailed
            }
        };
    }

    let Some(chat_id) = chat_id else {
        return PrefixReply::PrivateChat(prefixes.default_prefix().to_string());
    };

    match is_admin().await {
        Ok(true) => {}
        Ok(false) => return PrefixReply::MissingPermission,
        Err(e) => {
            warn!("Admin check failed in chat {}: {}", chat_id, e);
            return PrefixReply::MissingPermission;
        }
    }

    if let Err(e) = prefixes.set_prefix(chat_id, PrefixUpdate::parse(args)).await {
        error!("Failed to save prefix for chat {}: {}", chat_id, e);
        return PrefixReply::SaveFailed;
    }

    match prefixes.resolve(chat_id).await {
        Ok(prefix) => PrefixReply::Current(prefix),
        Err(e) => {
            error!("Failed to reload prefix for chat {}: {}", chat_id, e);
            PrefixReply::LoadFailed
        }
    }
}

/// Render a reply as Telegram HTML.
pub fn render(reply: &PrefixReply, lang: &str) -> String {
    match reply {
        PrefixReply::Current(prefix) => {
            let escaped = html_escape(prefix);
            let shown = if prefix.is_empty() {
                get_text(lang, "prefix.no_prefix")
            } else {
                escaped.clone()
            };
            format!(
                "{}\n{}",
                format_text(lang, "prefix.current", &[("prefix", shown.as_str())]),
                format_text(lang, "prefix.show_again", &[("prefix", escaped.as_str())]),
            )
        }
        PrefixReply::MissingPermission => get_text(lang, "common.error_missing_permission"),
        PrefixReply::PrivateChat(default) => {
            let escaped = html_escape(default);
            format_text(lang, "prefix.private_only_default", &[("prefix", escaped.as_str())])
        }
        PrefixReply::LoadFailed => get_text(lang, "prefix.load_failed"),
        PrefixReply::SaveFailed => get_text(lang, "prefix.save_failed"),
    }
}

/// Handle the prefix command.
pub async fn prefix_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    invocation: Invocation,
) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;
    let user_id = msg.from.as_ref().map(|u| u.id);

    let permissions = &state.permissions;

    let reply = run_prefix_command(&*state.prefixes, invocation.chat, &invocation.args, || async move {
        match user_id {
            Some(user_id) => permissions.is_admin(chat_id, user_id).await,
            None => Ok(false),
        }
    })
    .await;

    bot.send_message(chat_id, render(&reply, &state.lang))
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.reply_target()))
        .await?;

    Ok(())
}
