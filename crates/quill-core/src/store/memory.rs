//! In-memory user store
//!
//! Backed by a `tokio::sync::RwLock<HashMap>`. Used by the test suites and
//! by the server when no `DATABASE_URL` is configured. The lock is never
//! held across anything but the map operation itself.

use super::{StoreError, StoreResult, UserStore};
use crate::user::{NewUser, UpdateUserInput, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory user store
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Remove a user outright (external deletion)
    pub async fn remove(&self, id: Uuid) -> Option<User> {
        self.users.write().await.remove(&id)
    }
}

fn check_unique(
    users: &HashMap<Uuid, User>,
    skip: Option<Uuid>,
    email: Option<&str>,
    username: Option<&str>,
) -> StoreResult<()> {
    for user in users.values().filter(|u| Some(u.id) != skip) {
        if email.is_some_and(|e| user.email == e) {
            return Err(StoreError::Conflict("email".to_string()));
        }
        if username.is_some_and(|n| user.username == n) {
            return Err(StoreError::Conflict("username".to_string()));
        }
    }
    Ok(())
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        check_unique(&users, None, Some(&user.email), Some(&user.username))?;

        let user = user.into_user();
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, input: UpdateUserInput) -> StoreResult<User> {
        let mut users = self.users.write().await;
        check_unique(
            &users,
            Some(id),
            input.email.as_deref(),
            input.username.as_deref(),
        )?;

        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        input.apply_to(user);
        Ok(user.clone())
    }

    async fn update_refresh_hash(&self, id: Uuid, hash: Option<String>) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.refresh_token_hash = hash;
        user.updated_at = Utc::now();
        Ok(())
    }
}
