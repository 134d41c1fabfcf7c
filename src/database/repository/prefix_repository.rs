//! Prefix repository.
//!
//! The database is the source of truth for custom prefixes. Caching lives
//! one level up, in `PrefixService`.

use std::future::Future;

use mongodb::bson::doc;
use mongodb::options::{IndexOptions, ReplaceOptions};
use mongodb::{Collection, IndexModel};
use tracing::debug;

use crate::database::models::{CustomPrefix, GuildBotId, PrefixRecord};
use crate::database::Database;
use crate::error::PrefixError;

/// Persistent storage for custom prefixes.
pub trait PrefixStore: Send + Sync + 'static {
    /// Load the prefix setting for a chat. A missing record is `Unset`.
    fn load_prefix(
        &self,
        key: GuildBotId,
    ) -> impl Future<Output = Result<CustomPrefix, PrefixError>> + Send;

    /// Apply `mutate` to the chat's record (a fresh one if none exists) and
    /// persist the result.
    fn update_prefix<F>(
        &self,
        key: GuildBotId,
        mutate: F,
    ) -> impl Future<Output = Result<(), PrefixError>> + Send
    where
        F: FnOnce(&mut PrefixRecord) + Send;
}

/// MongoDB-backed prefix store.
#[derive(Clone)]
pub struct PrefixRepository {
    collection: Collection<PrefixRecord>,
}

impl PrefixRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("prefixes"),
        }
    }

    /// Create the unique (chat_id, bot_id) index if it doesn't exist yet.
    pub async fn ensure_indexes(&self) -> Result<(), PrefixError> {
        let index = IndexModel::builder()
            .keys(doc! { "chat_id": 1, "bot_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection.create_index(index).await?;
        Ok(())
    }

    async fn find(&self, key: GuildBotId) -> Result<Option<PrefixRecord>, PrefixError> {
        let filter = doc! { "chat_id": key.chat_id, "bot_id": key.bot_id };
        let result = self.collection.find_one(filter).await?;
        debug!("DB get prefix for {}: {:?}", key, result.is_some());
        Ok(result)
    }
}

impl PrefixStore for PrefixRepository {
    async fn load_prefix(&self, key: GuildBotId) -> Result<CustomPrefix, PrefixError> {
        Ok(self
            .find(key)
            .await?
            .map(|record| record.custom_prefix())
            .unwrap_or_default())
    }

    async fn update_prefix<F>(&self, key: GuildBotId, mutate: F) -> Result<(), PrefixError>
    where
        F: FnOnce(&mut PrefixRecord) + Send,
    {
        let mut record = self
            .find(key)
            .await?
            .unwrap_or_else(|| PrefixRecord::new(key));
        mutate(&mut record);

        let filter = doc! { "chat_id": key.chat_id, "bot_id": key.bot_id };
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(filter, &record)
            .with_options(options)
            .await?;

        debug!("Saved prefix for {}: {:?}", key, record.prefix);
        Ok(())
    }
}
