//! Quill Configuration Management
//!
//! Handles configuration from environment variables and an optional TOML
//! file. Token secrets have no defaults: a process that starts without them
//! fails at load time rather than on the first login.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Default access-token lifetime (7 days)
pub const DEFAULT_ACCESS_EXPIRATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Default refresh-token lifetime (30 days)
pub const DEFAULT_REFRESH_EXPIRATION_SECS: u64 = 30 * 24 * 60 * 60;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database connection
    pub database: DatabaseConfig,

    /// Token signing configuration
    pub jwt: JwtSettings,

    /// Password hashing cost parameters
    pub password: PasswordSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `QUILL_CONFIG` (if set) overlaid with the
    /// environment, then validate it
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var("QUILL_CONFIG") {
            Ok(path) => {
                tracing::debug!(path = %path, "Loading configuration file");
                Self::from_file(path)?.with_env_override()
            }
            Err(_) => Self::from_env(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// `from_env` is this with `std::env::var`; tests pass a map instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file (not validated until `with_env_override`)
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError { path, message },
            other => other,
        })
    }

    fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence) and validate
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_overrides(&|key: &str| std::env::var(key).ok())?;
        self.validate()?;
        Ok(self)
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "API_PORT".to_string(),
                value: port,
            })?;
        }
        if let Some(prefix) = lookup("API_PREFIX") {
            self.server.api_prefix = prefix.trim_matches('/').to_string();
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Database
        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(max) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = max.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DATABASE_MAX_CONNECTIONS".to_string(),
                value: max,
            })?;
        }

        // JWT
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt.access_secret = secret;
        }
        if let Some(exp) = lookup("JWT_EXPIRATION") {
            self.jwt.access_expiration_secs = parse_duration_secs("JWT_EXPIRATION", &exp)?;
        }
        if let Some(secret) = lookup("JWT_REFRESH_SECRET") {
            self.jwt.refresh_secret = secret;
        }
        if let Some(exp) = lookup("JWT_REFRESH_EXPIRATION") {
            self.jwt.refresh_expiration_secs =
                parse_duration_secs("JWT_REFRESH_EXPIRATION", &exp)?;
        }
        if let Some(issuer) = lookup("JWT_ISSUER") {
            self.jwt.issuer = issuer;
        }

        // Password hashing
        if let Some(v) = lookup("PASSWORD_MEMORY_COST_KIB") {
            self.password.memory_cost_kib = parse_u32("PASSWORD_MEMORY_COST_KIB", v)?;
        }
        if let Some(v) = lookup("PASSWORD_TIME_COST") {
            self.password.time_cost = parse_u32("PASSWORD_TIME_COST", v)?;
        }
        if let Some(v) = lookup("PASSWORD_PARALLELISM") {
            self.password.parallelism = parse_u32("PASSWORD_PARALLELISM", v)?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(())
    }

    /// Check that required settings are present and sane
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.access_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.jwt.refresh_secret.is_empty() {
            return Err(ConfigError::MissingRequired(
                "JWT_REFRESH_SECRET".to_string(),
            ));
        }
        if self.jwt.access_expiration_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_EXPIRATION".to_string(),
                value: "0".to_string(),
            });
        }
        if self.jwt.refresh_expiration_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_REFRESH_EXPIRATION".to_string(),
                value: "0".to_string(),
            });
        }
        if self.password.time_cost == 0 || self.password.parallelism == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PASSWORD_TIME_COST/PASSWORD_PARALLELISM".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Path prefix for API routes (without slashes)
    pub api_prefix: String,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_prefix: "api".to_string(),
            // Empty by default - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; the in-memory store is used when unset
    pub url: Option<String>,

    /// Connection pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

/// Token signing configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtSettings {
    /// HMAC secret for access tokens
    pub access_secret: String,

    /// Access token lifetime in seconds
    #[serde(
        rename = "access_expiration",
        deserialize_with = "deserialize_duration"
    )]
    pub access_expiration_secs: u64,

    /// HMAC secret for refresh tokens
    pub refresh_secret: String,

    /// Refresh token lifetime in seconds
    #[serde(
        rename = "refresh_expiration",
        deserialize_with = "deserialize_duration"
    )]
    pub refresh_expiration_secs: u64,

    /// Token issuer identifier
    pub issuer: String,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            access_secret: String::new(),
            access_expiration_secs: DEFAULT_ACCESS_EXPIRATION_SECS,
            refresh_secret: String::new(),
            refresh_expiration_secs: DEFAULT_REFRESH_EXPIRATION_SECS,
            issuer: "quill-api".to_string(),
        }
    }
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("access_secret", &"<redacted>")
            .field("access_expiration_secs", &self.access_expiration_secs)
            .field("refresh_secret", &"<redacted>")
            .field("refresh_expiration_secs", &self.refresh_expiration_secs)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordSettings {
    /// Memory cost in KiB
    pub memory_cost_kib: u32,

    /// Iterations
    pub time_cost: u32,

    /// Lanes
    pub parallelism: u32,
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            memory_cost_kib: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Parse a duration such as `"3600"`, `"15m"`, `"7d"` into seconds
///
/// Supported units: `s`, `m`, `h`, `d`, `w`. A bare number is seconds.
pub fn parse_duration_secs(key: &str, value: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    };

    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let amount: u64 = number.parse().map_err(|_| invalid())?;
    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        _ => return Err(invalid()),
    };

    match amount.checked_mul(multiplier) {
        Some(secs) if secs > 0 => Ok(secs),
        _ => Err(invalid()),
    }
}

fn parse_u32(key: &str, value: String) -> Result<u32, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Accept either an integer number of seconds or a duration string
fn deserialize_duration<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Secs(secs) => Ok(secs),
        Raw::Text(text) => {
            parse_duration_secs("duration", &text).map_err(serde::de::Error::custom)
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
