//! Configuration module for Sigil.
//!
//! Loads configuration from environment variables.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::cache::CacheConfig;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Bot running mode
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Owner user IDs (comma-separated)
    /// These users pass every permission check.
    pub owner_ids: Vec<u64>,

    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    /// Prefix for chats without a custom one. May be empty.
    pub default_prefix: String,
    pub default_lang: String,

    // Prefix cache
    pub prefix_refresh: Duration,
    pub prefix_idle: Duration,
    /// Expected number of concurrent workers hitting the cache.
    pub cache_workers: usize,

    /// Address for the cache statistics endpoint, disabled when unset.
    pub stats_addr: Option<SocketAddr>,
}

impl Config {
    /// Load configuration from environment variables (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_mode = match var("BOT_MODE").map(|m| m.to_lowercase()).as_deref() {
            None | Some("polling") => BotMode::Polling,
            Some("webhook") => BotMode::Webhook,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "BOT_MODE",
                    value: other.to_string(),
                });
            }
        };

        let webhook_url = var("WEBHOOK_URL");
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            return Err(ConfigError::Missing("WEBHOOK_URL"));
        }

        // Unparseable ids are skipped
        let owner_ids = var("OWNER_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .collect();

        // Zero would turn the cache into a pass-through and stall maintenance.
        let secs = |name: &'static str, default: u64| -> Result<Duration, ConfigError> {
            match parse_or(var(name), name, default)? {
                0 => Err(ConfigError::Invalid {
                    name,
                    value: "0".to_string(),
                }),
                secs => Ok(Duration::from_secs(secs)),
            }
        };

        let stats_addr = var("STATS_ADDR")
            .map(|raw| {
                raw.parse().map_err(|_| ConfigError::Invalid {
                    name: "STATS_ADDR",
                    value: raw,
                })
            })
            .transpose()?;

        Ok(Self {
            bot_token: var("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?,
            bot_mode,
            webhook_url,
            webhook_port: parse_or(var("WEBHOOK_PORT"), "WEBHOOK_PORT", 8443)?,
            webhook_secret: var("WEBHOOK_SECRET"),
            owner_ids,
            mongodb_uri: var("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?,
            mongodb_database: var("MONGODB_DATABASE").unwrap_or_else(|| "sigil".to_string()),
            // Read raw: an explicitly empty default prefix is allowed.
            default_prefix: lookup("DEFAULT_PREFIX").unwrap_or_else(|| "!".to_string()),
            default_lang: var("DEFAULT_LANG").unwrap_or_else(|| "en".to_string()),
            prefix_refresh: secs("PREFIX_REFRESH_SECS", 60)?,
            prefix_idle: secs("PREFIX_IDLE_SECS", 60)?,
            cache_workers: parse_or(var("CACHE_SHARDS"), "CACHE_SHARDS", 16)?,
            stats_addr,
        })
    }

    /// Prefix cache settings derived from this config.
    pub fn prefix_cache(&self) -> CacheConfig {
        CacheConfig::with_workers(self.cache_workers)
            .refresh_interval(self.prefix_refresh)
            .idle_timeout(self.prefix_idle)
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
