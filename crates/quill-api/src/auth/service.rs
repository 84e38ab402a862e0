//! Authentication service layer
//!
//! Business logic for registration, login, token refresh and logout. A user
//! session moves Anonymous -> Authenticated on register/login, stays
//! Authenticated with a fresh pair on every refresh, and returns to
//! Anonymous on logout. Refreshing from Anonymous fails closed.
//!
//! `logout` and `refresh` trust the user id they are given; callers must
//! have authenticated the request first.

use super::jwt::{TokenIssuer, TokenKind};
use super::password::{hash_blocking, verify_blocking, PasswordConfig};
use super::refresh::RefreshTokenStore;
use super::validation::validate_input;
use crate::error::AppError;
use quill_core::{NewUser, StoreError, User, UserPublic, UserStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "email must be an email"))]
    pub email: String,
    #[validate(length(min = 1, message = "username should not be empty"))]
    pub username: String,
    #[validate(length(
        min = 6,
        message = "password must be longer than or equal to 6 characters"
    ))]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username should not be empty"))]
    pub username: String,
    #[validate(length(min = 1, message = "password should not be empty"))]
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refreshToken should not be empty"))]
    pub refresh_token: String,
}

/// Authentication response with tokens
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserPublic,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    issuer: TokenIssuer,
    refresh_store: RefreshTokenStore,
    password_config: PasswordConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        issuer: TokenIssuer,
        password_config: PasswordConfig,
    ) -> Self {
        let refresh_store = RefreshTokenStore::new(users.clone(), password_config.clone());
        Self {
            users,
            issuer,
            refresh_store,
            password_config,
        }
    }

    /// Register a new user
    ///
    /// # Errors
    /// * `Validation` - malformed email, empty username, short password
    /// * `Conflict` - email or username already taken
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        validate_input(&request).map_err(AppError::Validation)?;

        if self.users.find_by_email(&request.email).await?.is_some()
            || self.users.find_by_username(&request.username).await?.is_some()
        {
            return Err(AppError::Conflict);
        }

        let password_hash = hash_blocking(request.password, self.password_config.clone()).await?;

        // A concurrent registration can still win the race after the pre-check
        let user = self
            .users
            .create(NewUser {
                email: request.email,
                username: request.username,
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AppError::Conflict,
                other => other.into(),
            })?;

        debug!(user_id = %user.id, "User registered");
        self.start_session(user).await
    }

    /// Log in by username and password
    ///
    /// Unknown users and wrong passwords fail identically.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        validate_input(&request).map_err(AppError::Validation)?;

        let user = self
            .users
            .find_by_username(&request.username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let is_valid = verify_blocking(request.password, user.password_hash.clone()).await?;
        if !is_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.start_session(user).await
    }

    /// Invalidate the user's refresh token
    ///
    /// Idempotent; an already logged-out user still succeeds.
    pub async fn logout(&self, user_id: Uuid) -> Result<bool, AppError> {
        self.refresh_store.invalidate(user_id).await?;
        debug!(user_id = %user_id, "Refresh token invalidated");
        Ok(true)
    }

    /// Exchange the user's live refresh token for a new pair
    ///
    /// The presented token is single-use: rotation makes it permanently
    /// unusable.
    ///
    /// # Errors
    /// * `AccessDenied` - no live refresh token, or `refresh_token` is not it
    pub async fn refresh(&self, user_id: Uuid, refresh_token: &str) -> Result<AuthResponse, AppError> {
        let user = match self.users.find_by_id(user_id).await? {
            Some(user) if user.has_refresh_token() => user,
            _ => return Err(AppError::AccessDenied),
        };

        match self.issuer.verify(refresh_token, TokenKind::Refresh) {
            Ok(claims) if claims.user_id().ok() == Some(user_id) => {}
            Ok(_) => {
                warn!(user_id = %user_id, "Refresh token issued for another user");
                return Err(AppError::AccessDenied);
            }
            Err(e) => {
                debug!(user_id = %user_id, error = %e, "Refresh token rejected");
                return Err(AppError::AccessDenied);
            }
        }

        if !self.refresh_store.matches(user_id, refresh_token).await? {
            return Err(AppError::AccessDenied);
        }

        self.start_session(user).await
    }

    /// Issue a pair and make its refresh token the live one
    async fn start_session(&self, user: User) -> Result<AuthResponse, AppError> {
        let pair = self.issuer.issue(&user)?;
        self.refresh_store.rotate(user.id, &pair.refresh_token).await?;

        // Rotation bumps updated_at
        let user = self.users.find_by_id(user.id).await?.unwrap_or(user);

        Ok(AuthResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            user: user.into(),
        })
    }
}
