//! Sigil - Telegram bot with per-group command prefixes.
//!
//! Group administrators can change the prefix commands start with. Every
//! incoming message needs its chat's prefix, so prefixes are served from a
//! refresh-ahead cache in front of MongoDB.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - MongoDB integration and the prefix store
//! - `cache` - Read-through cache with background refresh and idle eviction
//! - `prefix` - Prefix resolution and updates
//! - `permissions` - Admin checking with caching
//! - `bot` - Dispatcher, polling/webhook runtimes, stats endpoint
//! - `plugins` - Command handlers
//! - `i18n` - Reply translations
//! - `utils` - Utility functions

mod bot;
mod cache;
mod config;
mod database;
mod error;
mod i18n;
mod permissions;
mod plugins;
mod prefix;
mod utils;

use std::sync::Arc;

use anyhow::Context;
use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use bot::AppState;
use cache::CacheRegistry;
use config::Config;
use database::{Database, PrefixRepository};
use prefix::PrefixService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sigil=info,teloxide=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Sigil bot...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);
    info!("Default prefix: {:?}", config.default_prefix);

    i18n::init();
    let lang = i18n::resolve_locale(&config.default_lang);

    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    let store = PrefixRepository::new(&db);
    store.ensure_indexes().await?;
    info!("Database connected");

    // Throttle respects Telegram's per-chat and global rate limits
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());

    // Prefix records are keyed by bot id, so we need it before any lookup.
    let me = bot.get_me().await.context("Failed to resolve bot identity")?;
    let bot_id = i64::try_from(me.id.0).context("Bot id out of range")?;
    let bot_username = me.username().to_string();
    info!("Bot username: @{} (id {})", bot_username, bot_id);

    if config.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    let prefixes = Arc::new(PrefixService::new(
        Arc::new(store),
        bot_id,
        config.default_prefix.clone(),
        config.prefix_cache(),
    ));

    let registry = CacheRegistry::new();
    prefixes.register_metrics(&registry);
    prefixes.start();

    let stats_server = config.stats_addr.map(|addr| {
        let registry = registry.clone();
        tokio::spawn(async move {
            if let Err(e) = bot::stats::serve(addr, registry).await {
                error!("Stats endpoint stopped: {:#}", e);
            }
        })
    });

    let state = AppState::new(
        &bot,
        Arc::clone(&prefixes),
        config.owner_ids.clone(),
        bot_username,
        lang,
    );
    let dispatcher = bot::build_dispatcher(bot.clone(), state);

    let result = bot::run(&config, bot, dispatcher).await;

    if let Some(server) = stats_server {
        server.abort();
    }
    prefixes.stop();
    info!("Sigil stopped");

    result
}
