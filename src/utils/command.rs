//! Command recognition.
//!
//! A command is `<prefix><name>[@botname] [args]`. Telegram's native `/`
//! is always accepted next to the chat's own prefix, so a chat stuck with
//! an unusable prefix can still run `/prefix reset`.

/// A recognised command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    /// Lowercased command name without prefix or `@botname`.
    pub name: String,
    /// Everything after the command name, trimmed.
    pub args: &'a str,
}

/// Parse `text` as a command for this chat.
///
/// Returns `None` if the text doesn't start with a known prefix or the
/// command is addressed to another bot.
pub fn parse_command<'a>(text: &'a str, prefix: &str, bot_username: &str) -> Option<ParsedCommand<'a>> {
    let body = strip_prefix(text, prefix)?;

    let (word, args) = match body.find(char::is_whitespace) {
        Some(pos) => (&body[..pos], body[pos..].trim()),
        None => (body, ""),
    };

    let name = match word.split_once('@') {
        Some((name, target)) if target.eq_ignore_ascii_case(bot_username) => name,
        Some(_) => return None,
        None => word,
    };

    if name.is_empty() {
        return None;
    }

    Some(ParsedCommand {
        name: name.to_lowercase(),
        args,
    })
}

fn strip_prefix<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if !prefix.is_empty()
        && let Some(rest) = text.strip_prefix(prefix)
    {
        return Some(rest);
    }
    if let Some(rest) = text.strip_prefix('/') {
        return Some(rest);
    }
    // Empty prefix: every message is a candidate.
    prefix.is_empty().then_some(text)
}
