/// Authentication middleware for protecting routes
///
/// Extracts and validates the access token from the Authorization header,
/// resolves its subject to a live user, and adds the authenticated user to
/// the request extensions. Any failure rejects the request before the
/// handler runs.
use super::jwt::{JwtError, TokenIssuer, TokenKind};
use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use quill_core::{StoreError, User, UserPublic, UserStore};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Authenticated user information
///
/// Added to request extensions by the auth middleware and extracted in
/// handlers using `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User's unique identifier
    pub user_id: Uuid,
    /// Username from the store (not the claim)
    pub username: String,
    /// Stripped user record as resolved at request time
    pub user: UserPublic,
}

/// Authentication middleware errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    #[error("Token subject no longer exists")]
    UnknownUser,

    #[error("User lookup failed: {0}")]
    Store(#[from] StoreError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(e) => AppError::Internal(e.to_string()),
            _ => AppError::Unauthenticated,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// Resolves access tokens to live users
#[derive(Clone)]
pub struct RequestAuthorizer {
    issuer: TokenIssuer,
    users: Arc<dyn UserStore>,
}

impl RequestAuthorizer {
    pub fn new(issuer: TokenIssuer, users: Arc<dyn UserStore>) -> Self {
        Self { issuer, users }
    }

    /// Verify an access token and load its subject
    ///
    /// Tokens of deleted users are rejected even before they expire.
    pub async fn authorize(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.issuer.verify(token, TokenKind::Access)?;
        let user_id = claims.user_id()?;

        let user: User = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        Ok(AuthenticatedUser {
            user_id: user.id,
            username: user.username.clone(),
            user: user.into(),
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// The scheme is matched case-sensitively.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

/// Authentication middleware that requires a valid access token
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the JWT signature, issuer and expiration
/// 3. Resolves the subject to an existing user
/// 4. Adds AuthenticatedUser to request extensions
///
/// # Usage
///
/// ```ignore
/// use axum::{Router, routing::get, middleware};
/// use quill_api::auth::middleware::auth_middleware;
///
/// let app = Router::new()
///     .route("/protected", get(protected_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
///     .with_state(state);
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let context = AuditContext::from_headers(request.headers());

    let token = extract_bearer_token(request.headers())?;

    let user = match state.authorizer.authorize(token).await {
        Ok(user) => user,
        Err(AuthError::Store(e)) => return Err(AuthError::Store(e)),
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                reason: e.to_string(),
                context,
            });
            return Err(e);
        }
    };

    tracing::debug!(user_id = %user.user_id, "Request authenticated");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
