//! Permission checker with caching.

use std::time::Duration;

use moka::future::Cache;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatMemberKind, UserId};
use tracing::debug;

/// Chat owners and administrators may manage the chat.
fn is_privileged(kind: &ChatMemberKind) -> bool {
    matches!(kind, ChatMemberKind::Owner(_) | ChatMemberKind::Administrator(_))
}

/// Cache key for admin lookups.
type AdminCacheKey = (i64, u64); // (chat_id, user_id)

/// Permission checker with caching support.
///
/// Bot owners (from OWNER_IDS env) automatically bypass all permission checks.
#[derive(Clone)]
pub struct Permissions {
    bot: Bot,
    cache: Cache<AdminCacheKey, bool>,
    /// Bot owner IDs - these users have all permissions in all chats.
    owner_ids: Vec<u64>,
}

impl Permissions {
    /// Create a new permission checker with bot owner IDs.
    pub fn with_owners(bot: Bot, owner_ids: Vec<u64>) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .time_to_idle(Duration::from_secs(120)) // 2 minutes idle
            .build();

        Self {
            bot,
            cache,
            owner_ids,
        }
    }

    /// Check if a user is a bot owner.
    #[inline]
    pub fn is_bot_owner(&self, user_id: UserId) -> bool {
        self.owner_ids.contains(&user_id.0)
    }

    /// Check if a user is an admin (including owner).
    /// Bot owners always return true.
    pub async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> anyhow::Result<bool> {
        if self.is_bot_owner(user_id) {
            debug!("User {} is bot owner, granting admin", user_id);
            return Ok(true);
        }

        let cache_key = (chat_id.0, user_id.0);

        if let Some(cached) = self.cache.get(&cache_key).await {
            debug!("Admin cache hit for user {} in chat {}", user_id, chat_id);
            return Ok(cached);
        }

        debug!("Admin cache miss for user {} in chat {}", user_id, chat_id);

        let member = self.bot.get_chat_member(chat_id, user_id).await?;
        let is_admin = is_privileged(&member.kind);

        // Cache non-admins too
        self.cache.insert(cache_key, is_admin).await;

        Ok(is_admin)
    }

    /// Invalidate cached admin status for a user.
    ///
    /// Call this when admin status might have changed.
    #[allow(dead_code)]
    pub async fn invalidate(&self, chat_id: ChatId, user_id: UserId) {
        self.cache.invalidate(&(chat_id.0, user_id.0)).await;
        debug!(
            "Invalidated admin cache for user {} in chat {}",
            user_id, chat_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bot_owner_is_admin_everywhere() {
        let perms = Permissions::with_owners(Bot::new("0:test"), vec![1234]);

        assert!(perms.is_bot_owner(UserId(1234)));
        assert!(!perms.is_bot_owner(UserId(1)));
        // No API call is made for owners.
        assert!(perms.is_admin(ChatId(-100), UserId(1234)).await.unwrap());
    }

    #[tokio::test]
    async fn test_cached_admin_status_is_used() {
        let perms = Permissions::with_owners(Bot::new("0:test"), vec![]);
        perms.cache.insert((-100, 5), true).await;
        perms.cache.insert((-100, 6), false).await;

        assert!(perms.is_admin(ChatId(-100), UserId(5)).await.unwrap());
        assert!(!perms.is_admin(ChatId(-100), UserId(6)).await.unwrap());

        perms.invalidate(ChatId(-100), UserId(5)).await;
        assert!(perms.cache.get(&(-100, 5)).await.is_none());
    }
}
