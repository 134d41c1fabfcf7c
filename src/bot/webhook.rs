//! Webhook mode implementation for the bot.
//!
//! Uses teloxide's built-in axum webhook support, which registers the
//! webhook with Telegram, serves updates and deletes the webhook on shutdown.

use std::net::SocketAddr;

use anyhow::Context;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::info;
use url::Url;

use super::dispatcher::ThrottledBot;
use crate::config::Config;

/// Build webhook options from config.
pub fn webhook_options(config: &Config) -> anyhow::Result<Options> {
    let raw = config
        .webhook_url
        .as_deref()
        .context("WEBHOOK_URL must be set when using webhook mode")?;
    let url = Url::parse(raw).context("Invalid WEBHOOK_URL format")?;

    // Listen on all interfaces at the configured port
    let address = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));

    let mut options = Options::new(address, url);
    if let Some(secret) = &config.webhook_secret {
        options = options.secret_token(secret.clone());
    }
    Ok(options)
}

/// Start the bot in webhook mode and dispatch until shutdown.
pub async fn start_webhook(
    config: &Config,
    mut dispatcher: Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey>,
    bot: ThrottledBot,
) -> anyhow::Result<()> {
    let options = webhook_options(config)?;

    info!("Setting webhook URL: {}", options.url);
    info!("Listening on: {}", options.address);

    // Webhook setup only needs the unthrottled bot.
    let listener = webhooks::axum(bot.inner().clone(), options)
        .await
        .context("Failed to setup webhook")?;

    info!("Webhook setup complete, waiting for updates...");

    let error_handler = LoggingErrorHandler::with_custom_text("Error from update listener");
    dispatcher
        .dispatch_with_listener(listener, error_handler)
        .await;

    Ok(())
}
