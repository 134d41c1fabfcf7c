//! Utility functions.
//!
//! Collection of helper functions used across the bot.

pub mod command;
pub mod reply;

pub use command::parse_command;
pub use reply::ReplyExt;

/// Escape text for Telegram's HTML parse mode.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
