//! Start and help plugins.

use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};

use super::Invocation;
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::i18n::format_text;
use crate::utils::{html_escape, ReplyExt};

/// Greeting that tells the user which prefix to use here.
pub fn start_text(lang: &str, prefix: &str) -> String {
    format_text(lang, "start.text", &[("prefix", html_escape(prefix).as_str())])
}

/// Command overview, with usage lines rendered for this chat's prefix.
pub fn help_text(lang: &str, prefix: &str) -> String {
    format_text(lang, "help.text", &[("prefix", html_escape(prefix).as_str())])
}

/// Handle the start command.
pub async fn start_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    invocation: Invocation,
) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, start_text(&state.lang, &invocation.prefix))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle the help command.
pub async fn help_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    invocation: Invocation,
) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, help_text(&state.lang, &invocation.prefix))
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.reply_target()))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_uses_chat_prefix() {
        let text = help_text("en", ";;");
        assert!(text.contains("<code>;;prefix no_prefix</code>"));
        assert!(text.contains("<code>;;prefix reset</code>"));
    }

    #[test]
    fn test_start_with_empty_prefix() {
        let text = start_text("en", "");
        assert!(text.contains("<code>help</code>"));
    }
}
