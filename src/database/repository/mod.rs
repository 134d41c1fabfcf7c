//! Repositories.

#[cfg(test)]
pub mod memory;
mod prefix_repository;

pub use prefix_repository::{PrefixRepository, PrefixStore};
