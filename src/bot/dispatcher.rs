//! Message dispatcher setup.
//!
//! Builds the dispatcher with the command handlers.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::database::PrefixRepository;
use crate::permissions::Permissions;
use crate::plugins;
use crate::prefix::PrefixService;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Prefix resolution and updates (owns the prefix cache).
    pub prefixes: Arc<PrefixService<PrefixRepository>>,

    /// Permission checker with admin caching.
    pub permissions: Permissions,

    /// Bot username (without @) for `/command@bot` matching.
    pub bot_username: String,

    /// Reply language.
    pub lang: String,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        bot: &ThrottledBot,
        prefixes: Arc<PrefixService<PrefixRepository>>,
        owner_ids: Vec<u64>,
        bot_username: String,
        lang: String,
    ) -> Self {
        // Permissions needs the inner Bot for API calls
        let permissions = Permissions::with_owners(bot.inner().clone(), owner_ids);

        Self {
            prefixes,
            permissions,
            bot_username,
            lang,
        }
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    state: AppState,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    Update::filter_message().branch(plugins::command_handler())
}
