//! Plugin system for command handlers.
//!
//! Commands use the chat's own prefix, so they can't go through teloxide's
//! `BotCommands` parser. `command_handler` resolves the prefix, recognises
//! the command and puts an [`Invocation`] into the handler dependencies.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding a `Command` variant and its names
//! 3. Adding the branch to `command_handler()`

pub mod prefix;
pub mod start;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{debug, warn};

use crate::bot::dispatcher::AppState;
use crate::utils::parse_command;

/// All bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Prefix,
}

impl Command {
    /// Look up a command by its (lowercased) name or alias.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "prefix" | "pre" => Some(Self::Prefix),
            _ => None,
        }
    }
}

/// A recognised command in a message.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: Command,
    /// Everything after the command name, trimmed.
    pub args: String,
    /// Group the command was sent in; `None` in private chats.
    pub chat: Option<i64>,
    /// The chat's effective prefix.
    pub prefix: String,
}

/// Group id for prefix purposes. Private chats have none.
pub fn group_id(chat: &teloxide::types::Chat) -> Option<i64> {
    (chat.is_group() || chat.is_supergroup()).then_some(chat.id.0)
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter_map_async(recognise)
        .branch(dptree::filter(|inv: Invocation| inv.command == Command::Start).endpoint(start::start_command))
        .branch(dptree::filter(|inv: Invocation| inv.command == Command::Help).endpoint(start::help_command))
        .branch(dptree::filter(|inv: Invocation| inv.command == Command::Prefix).endpoint(prefix::prefix_command))
}

/// Recognise a command using the chat's prefix.
async fn recognise(msg: Message, state: AppState) -> Option<Invocation> {
    let text = msg.text()?;
    let chat = group_id(&msg.chat);

    // On a store failure only `/` commands are recognised; the prefix
    // command then reports the failure itself.
    let prefix = match state.prefixes.resolve_for(chat).await {
        Ok(prefix) => prefix,
        Err(e) => {
            warn!("Prefix lookup failed for chat {}: {}", msg.chat.id, e);
            "/".to_string()
        }
    };

    let parsed = parse_command(text, &prefix, &state.bot_username)?;
    let command = Command::from_name(&parsed.name)?;
    debug!("Command {:?} in chat {} (prefix {:?})", command, msg.chat.id, prefix);

    Some(Invocation {
        command,
        args: parsed.args.to_string(),
        chat,
        prefix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names() {
        assert_eq!(Command::from_name("prefix"), Some(Command::Prefix));
        assert_eq!(Command::from_name("pre"), Some(Command::Prefix));
        assert_eq!(Command::from_name("help"), Some(Command::Help));
        assert_eq!(Command::from_name("warn"), None);
    }
}
