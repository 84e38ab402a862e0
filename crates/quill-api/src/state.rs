//! Application state management
//!
//! Author: hephaex@gmail.com

use crate::auth::{AuthService, JwtConfig, PasswordConfig, RequestAuthorizer, TokenIssuer};
use quill_core::config::AppConfig;
use quill_core::UserStore;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Register/login/logout/refresh
    pub auth: AuthService,
    /// Access-token guard for protected routes
    pub authorizer: RequestAuthorizer,
}

impl AppState {
    /// Create state with hashing costs taken from the config
    pub fn new(config: AppConfig, users: Arc<dyn UserStore>) -> Self {
        let password_config = PasswordConfig::from(&config.password);
        Self::with_password_config(config, users, password_config)
    }

    /// Create state with explicit hashing costs
    ///
    /// Tests use this with cheap Argon2 parameters.
    pub fn with_password_config(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        password_config: PasswordConfig,
    ) -> Self {
        let issuer = TokenIssuer::new(JwtConfig::from(&config.jwt));

        Self {
            auth: AuthService::new(users.clone(), issuer.clone(), password_config),
            authorizer: RequestAuthorizer::new(issuer, users),
            config,
            start_time: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
