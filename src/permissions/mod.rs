//! Permission system for checking user roles.
//!
//! Only administrators may change a group's prefix.
//!
//! ## Usage
//!
//! ```rust
//! let perms = Permissions::with_owners(bot.clone(), owner_ids);
//!
//! if perms.is_admin(chat_id, user_id).await? {
//!     // ...
//! }
//! ```

mod checker;

pub use checker::Permissions;
