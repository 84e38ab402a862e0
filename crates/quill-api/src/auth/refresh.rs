//! Refresh token store
//!
//! Each user owns at most one live refresh token. Only its Argon2 hash is
//! persisted, in the user record itself; writing a new hash invalidates the
//! previous token. Concurrent rotations for the same user are last-writer-wins.

use super::password::{hash_blocking, verify_blocking, PasswordConfig, PasswordError};
use quill_core::{StoreError, UserStore};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Refresh token store errors
#[derive(Debug, Error)]
pub enum RefreshStoreError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hash(#[from] PasswordError),
}

/// Persists the hash of each user's current refresh token
#[derive(Clone)]
pub struct RefreshTokenStore {
    users: Arc<dyn UserStore>,
    hash_config: PasswordConfig,
}

impl RefreshTokenStore {
    pub fn new(users: Arc<dyn UserStore>, hash_config: PasswordConfig) -> Self {
        Self { users, hash_config }
    }

    /// Hash `refresh_token` and make it the user's only valid refresh token
    pub async fn rotate(&self, user_id: Uuid, refresh_token: &str) -> Result<(), RefreshStoreError> {
        let hash = hash_blocking(refresh_token.to_string(), self.hash_config.clone()).await?;
        self.users.update_refresh_hash(user_id, Some(hash)).await?;
        Ok(())
    }

    /// Clear the stored hash (logout)
    pub async fn invalidate(&self, user_id: Uuid) -> Result<(), RefreshStoreError> {
        self.users.update_refresh_hash(user_id, None).await?;
        Ok(())
    }

    /// Whether `candidate` is the user's live refresh token
    ///
    /// False when the user is unknown or has no stored hash.
    pub async fn matches(&self, user_id: Uuid, candidate: &str) -> Result<bool, RefreshStoreError> {
        let stored = match self.users.find_by_id(user_id).await? {
            Some(user) => user.refresh_token_hash,
            None => None,
        };

        match stored {
            Some(hash) => Ok(verify_blocking(candidate.to_string(), hash).await?),
            None => Ok(false),
        }
    }
}
