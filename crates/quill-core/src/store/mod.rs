//! User store
//!
//! The narrow persistence boundary the authentication core talks to.
//! Lookups return `Ok(None)` when no record matches; `create` and `update`
//! fail with `StoreError::Conflict` on a username/email uniqueness violation.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

use crate::user::{NewUser, UpdateUserInput, User};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// User store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User not found")]
    NotFound,

    #[error("Uniqueness violation on {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Trait for user persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get user by ID
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Get user by username (exact match)
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Get user by email (exact match)
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Persist a new user
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    /// Apply a partial update to an existing user
    async fn update(&self, id: Uuid, input: UpdateUserInput) -> StoreResult<User>;

    /// Overwrite (or clear, with `None`) the stored refresh-token hash
    async fn update_refresh_hash(&self, id: Uuid, hash: Option<String>) -> StoreResult<()>;
}
