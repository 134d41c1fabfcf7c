//! Reply helper utilities.

use teloxide::types::{Message, MessageId};

/// Extension trait for consistent reply targets.
pub trait ReplyExt {
    /// Get the message ID to reply to for command responses.
    fn reply_target(&self) -> MessageId;
}

impl ReplyExt for Message {
    fn reply_target(&self) -> MessageId {
        self.id
    }
}
