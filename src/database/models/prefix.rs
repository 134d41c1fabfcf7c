//! Custom prefix model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store key: one record per (chat, bot) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuildBotId {
    pub chat_id: i64,
    pub bot_id: i64,
}

impl GuildBotId {
    pub fn new(chat_id: i64, bot_id: i64) -> Self {
        Self { chat_id, bot_id }
    }
}

impl fmt::Display for GuildBotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chat_id, self.bot_id)
    }
}

/// A chat's prefix setting.
///
/// `Empty` and `Unset` are different: an empty prefix means commands need
/// no prefix at all, unset means the global default applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum CustomPrefix {
    #[default]
    Unset,
    Empty,
    Value(String),
}

impl CustomPrefix {
    /// Map the persisted representation: missing/`null` is unset, `""` is empty.
    pub fn from_stored(stored: Option<String>) -> Self {
        match stored {
            None => Self::Unset,
            Some(s) if s.is_empty() => Self::Empty,
            Some(s) => Self::Value(s),
        }
    }

    /// Inverse of [`CustomPrefix::from_stored`].
    pub fn to_stored(&self) -> Option<String> {
        match self {
            Self::Unset => None,
            Self::Empty => Some(String::new()),
            Self::Value(s) => Some(s.clone()),
        }
    }

    /// The prefix commands must start with, given the global default.
    pub fn effective<'a>(&'a self, default: &'a str) -> &'a str {
        match self {
            Self::Unset => default,
            Self::Empty => "",
            Self::Value(s) => s,
        }
    }
}

/// Persisted prefix record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixRecord {
    pub chat_id: i64,
    pub bot_id: i64,

    /// `None` = use the default prefix, `Some("")` = no prefix.
    #[serde(default)]
    pub prefix: Option<String>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PrefixRecord {
    /// Create a record with no custom prefix.
    pub fn new(key: GuildBotId) -> Self {
        Self {
            chat_id: key.chat_id,
            bot_id: key.bot_id,
            prefix: None,
            updated_at: None,
        }
    }

    pub fn custom_prefix(&self) -> CustomPrefix {
        CustomPrefix::from_stored(self.prefix.clone())
    }

    pub fn set_prefix(&mut self, prefix: &CustomPrefix) {
        self.prefix = prefix.to_stored();
        self.updated_at = Some(Utc::now());
    }
}
