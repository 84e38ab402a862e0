//! Quill Core - Domain models, user store and shared configuration
//!
//! This crate defines the pieces of the Quill blog backend that the
//! authentication core depends on but does not own:
//! - User (identity) records and their public projection
//! - The `UserStore` boundary with PostgreSQL and in-memory implementations
//! - Configuration management

pub mod config;
pub mod store;
pub mod user;

pub use config::{
    AppConfig, ConfigError, DatabaseConfig, JwtSettings, LoggingConfig, PasswordSettings,
    ServerConfig,
};
pub use store::{InMemoryUserStore, PgUserStore, StoreError, UserStore};
pub use user::{NewUser, UpdateUserInput, User, UserPublic};
