//! JWT token issuing and verification
//!
//! Every successful login, registration or refresh mints a pair of
//! HMAC-SHA256 tokens carrying the same `{sub, username}` claims:
//! - an access token, signed with the access secret, presented as a Bearer token
//! - a refresh token, signed with a separate secret, exchanged for a new pair
//!
//! A token signed for one purpose never verifies as the other.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use quill_core::config::{
    JwtSettings, DEFAULT_ACCESS_EXPIRATION_SECS, DEFAULT_REFRESH_EXPIRATION_SECS,
};
use quill_core::User;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - user ID
    pub sub: String,
    /// JWT ID - makes every issued token unique
    pub jti: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
    /// Username at issue time
    pub username: String,
}

impl Claims {
    /// Parse the subject claim as a user ID
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidToken)
    }
}

/// Which of the two token secrets a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("No signing secret configured for {0} tokens")]
    MissingSecret(TokenKind),

    #[error("Lifetime of {0} tokens overflows the expiry timestamp")]
    LifetimeOverflow(TokenKind),

    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// JWT Configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret for access tokens
    pub access_secret: String,
    /// Access token lifetime in seconds (default: 7 days)
    pub access_expiration_secs: u64,
    /// Secret for refresh tokens
    pub refresh_secret: String,
    /// Refresh token lifetime in seconds (default: 30 days)
    pub refresh_expiration_secs: u64,
    /// Token issuer identifier
    pub issuer: String,
}

impl JwtConfig {
    /// Configuration with the given secrets and default lifetimes
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            access_expiration_secs: DEFAULT_ACCESS_EXPIRATION_SECS,
            refresh_secret: refresh_secret.into(),
            refresh_expiration_secs: DEFAULT_REFRESH_EXPIRATION_SECS,
            issuer: "quill-api".to_string(),
        }
    }

    fn secret(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }

    fn expiration_secs(&self, kind: TokenKind) -> u64 {
        match kind {
            TokenKind::Access => self.access_expiration_secs,
            TokenKind::Refresh => self.refresh_expiration_secs,
        }
    }
}

impl From<&JwtSettings> for JwtConfig {
    fn from(settings: &JwtSettings) -> Self {
        Self {
            access_secret: settings.access_secret.clone(),
            access_expiration_secs: settings.access_expiration_secs,
            refresh_secret: settings.refresh_secret.clone(),
            refresh_expiration_secs: settings.refresh_expiration_secs,
            issuer: settings.issuer.clone(),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_expiration_secs", &self.access_expiration_secs)
            .field("refresh_expiration_secs", &self.refresh_expiration_secs)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

/// Access + refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies both kinds of token
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    config: JwtConfig,
}

impl TokenIssuer {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    /// Mint a fresh access/refresh pair for a user
    pub fn issue(&self, user: &User) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: self.sign(TokenKind::Access, user.id, &user.username)?,
            refresh_token: self.sign(TokenKind::Refresh, user.id, &user.username)?,
        })
    }

    /// Sign a single token of the given kind
    pub fn sign(&self, kind: TokenKind, user_id: Uuid, username: &str) -> Result<String, JwtError> {
        let secret = self.config.secret(kind);
        if secret.is_empty() {
            return Err(JwtError::MissingSecret(kind));
        }

        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let exp = now
            .checked_add(self.config.expiration_secs(kind))
            .ok_or(JwtError::LifetimeOverflow(kind))?;
        let claims = Claims {
            iss: self.config.issuer.clone(),
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp,
            username: username.to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Validate signature, issuer and expiry against the secret for `kind`
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, JwtError> {
        let secret = self.config.secret(kind);
        if secret.is_empty() {
            return Err(JwtError::MissingSecret(kind));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::InvalidToken,
        })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::NewUser;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(JwtConfig::new("access-secret", "refresh-secret"))
    }

    fn user() -> User {
        NewUser {
            email: "a@x.com".to_string(),
            username: "alice".to_string(),
            password_hash: "hash".to_string(),
            first_name: None,
            last_name: None,
        }
        .into_user()
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[test]
    fn test_issue_and_verify_pair() {
        let issuer = issuer();
        let user = user();

        let pair = issuer.issue(&user).expect("Failed to issue tokens");

        let access = issuer.verify(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(access.user_id().unwrap(), user.id);
        assert_eq!(access.username, "alice");
        assert_eq!(access.iss, "quill-api");

        let refresh = issuer
            .verify(&pair.refresh_token, TokenKind::Refresh)
            .unwrap();
        assert_eq!(refresh.sub, user.id.to_string());
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_default_lifetimes() {
        let issuer = issuer();
        let pair = issuer.issue(&user()).unwrap();

        let access = issuer.verify(&pair.access_token, TokenKind::Access).unwrap();
        let refresh = issuer
            .verify(&pair.refresh_token, TokenKind::Refresh)
            .unwrap();

        assert_eq!(access.exp - access.iat, 7 * 86400);
        assert_eq!(refresh.exp - refresh.iat, 30 * 86400);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let issuer = issuer();
        let pair = issuer.issue(&user()).unwrap();

        let result = issuer.verify(&pair.refresh_token, TokenKind::Access);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));

        let result = issuer.verify(&pair.access_token, TokenKind::Refresh);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_consecutive_pairs_differ() {
        let issuer = issuer();
        let user = user();

        let first = issuer.issue(&user).unwrap();
        let second = issuer.issue(&user).unwrap();

        assert_ne!(first.access_token, second.access_token);
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[test]
    fn test_malformed_token() {
        let result = issuer().verify("invalid.token.here", TokenKind::Access);
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret() {
        let other = TokenIssuer::new(JwtConfig::new("other-access", "other-refresh"));
        let token = other.issue(&user()).unwrap().access_token;

        let result = issuer().verify(&token, TokenKind::Access);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_wrong_issuer() {
        let mut config = JwtConfig::new("access-secret", "refresh-secret");
        config.issuer = "someone-else".to_string();
        let token = TokenIssuer::new(config).issue(&user()).unwrap().access_token;

        let result = issuer().verify(&token, TokenKind::Access);
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let issuer = issuer();
        let now = now();

        // Expired 1 hour ago, well past the default leeway
        let claims = Claims {
            iss: "quill-api".to_string(),
            sub: Uuid::new_v4().to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
            username: "alice".to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("access-secret".as_bytes()),
        )
        .unwrap();

        let result = issuer.verify(&token, TokenKind::Access);
        assert!(matches!(result, Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let issuer = TokenIssuer::new(JwtConfig::new("", "refresh-secret"));

        let result = issuer.issue(&user());
        assert!(matches!(
            result,
            Err(JwtError::MissingSecret(TokenKind::Access))
        ));
    }

    #[test]
    fn test_overflowing_lifetime_is_an_error() {
        let mut config = JwtConfig::new("access-secret", "refresh-secret");
        config.refresh_expiration_secs = u64::MAX;
        let issuer = TokenIssuer::new(config);

        let result = issuer.issue(&user());
        assert!(matches!(
            result,
            Err(JwtError::LifetimeOverflow(TokenKind::Refresh))
        ));
    }

    #[test]
    fn test_non_uuid_subject() {
        let claims = Claims {
            iss: "quill-api".to_string(),
            sub: "not-a-uuid".to_string(),
            jti: "j".to_string(),
            iat: 0,
            exp: 0,
            username: "alice".to_string(),
        };
        assert!(matches!(claims.user_id(), Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_config_debug_hides_secrets() {
        let config = JwtConfig::new("top-secret-a", "top-secret-r");
        let debug = format!("{config:?}");
        assert!(!debug.contains("top-secret"));
    }
}
