//! Authentication API handlers
//!
//! Provides HTTP endpoints for registration, login, token refresh, logout
//! and the current user's profile. Every outcome is recorded as an audit
//! event.
//!
//! Author: hephaex@gmail.com

use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::auth::{
    validate_input, AuthenticatedUser, LoginRequest, RefreshRequest, RegisterRequest,
};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use quill_core::UserPublic;
use std::sync::Arc;

/// Register a new user account
///
/// Creates a user and starts a session for it.
///
/// # Request Body
///
/// * `email` - Valid email address (unique)
/// * `username` - Non-empty username (unique)
/// * `password` - At least 6 characters
/// * `firstName`, `lastName` - Optional display names
///
/// # Responses
///
/// * `201 Created` - User registered, tokens issued
/// * `400 Bad Request` - Invalid input
/// * `409 Conflict` - Email or username already taken
/// * `500 Internal Server Error` - Server error
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = crate::auth::AuthResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 409, description = "User already exists", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let context = AuditContext::from_headers(&headers);
    let username = request.username.clone();

    match state.auth.register(request).await {
        Ok(response) => {
            audit_log(&AuditEvent::RegistrationSuccess {
                user_id: response.user.id,
                username,
                context,
            });
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(e) => {
            audit_log(&AuditEvent::RegistrationFailure {
                username,
                reason: e.to_string(),
                context,
            });
            Err(e)
        }
    }
}

/// Login with username and password
///
/// Authenticates a user and returns a new access/refresh token pair. Any
/// previously issued refresh token stops working.
///
/// # Responses
///
/// * `200 OK` - Authentication successful, returns tokens
/// * `400 Bad Request` - Missing username or password
/// * `401 Unauthorized` - Invalid credentials
/// * `500 Internal Server Error` - Server error
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = crate::auth::AuthResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let context = AuditContext::from_headers(&headers);
    let username = request.username.clone();

    match state.auth.login(request).await {
        Ok(response) => {
            audit_log(&AuditEvent::LoginSuccess {
                user_id: response.user.id,
                username,
                context,
            });
            Ok(Json(response))
        }
        Err(e) => {
            audit_log(&AuditEvent::LoginFailure {
                username,
                reason: e.to_string(),
                context,
            });
            Err(e)
        }
    }
}

/// Refresh the token pair
///
/// Exchanges the caller's current refresh token for a new pair. The
/// presented refresh token is single-use. Requires a valid access token.
///
/// # Responses
///
/// * `200 OK` - New tokens issued
/// * `400 Bad Request` - Missing refresh token
/// * `401 Unauthorized` - Invalid or missing access token
/// * `403 Forbidden` - Refresh token absent, stale or not the caller's
/// * `500 Internal Server Error` - Server error
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = crate::auth::AuthResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Access denied", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    AppJson(request): AppJson<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_input(&request).map_err(AppError::Validation)?;
    let context = AuditContext::from_headers(&headers);

    match state.auth.refresh(user.user_id, &request.refresh_token).await {
        Ok(response) => {
            audit_log(&AuditEvent::TokenRefresh {
                user_id: user.user_id,
                username: user.username,
                context,
            });
            Ok(Json(response))
        }
        Err(e) => {
            audit_log(&AuditEvent::RefreshDenied {
                user_id: user.user_id,
                reason: e.to_string(),
                context,
            });
            Err(e)
        }
    }
}

/// Logout current session
///
/// Invalidates the caller's refresh token. Always succeeds for an
/// authenticated caller, including one that already logged out. The access
/// token stays valid until it expires.
///
/// # Responses
///
/// * `200 OK` - `true`
/// * `401 Unauthorized` - Invalid or missing authentication
/// * `500 Internal Server Error` - Server error
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logout successful", body = bool),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let success = state.auth.logout(user.user_id).await?;

    audit_log(&AuditEvent::Logout {
        user_id: user.user_id,
        username: user.username,
        context: AuditContext::from_headers(&headers),
    });

    Ok(Json(success))
}

/// Get current user profile
///
/// Returns the user resolved from the access token.
///
/// # Responses
///
/// * `200 OK` - User profile
/// * `401 Unauthorized` - Invalid or missing authentication
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user profile", body = UserPublic),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me_handler(Extension(user): Extension<AuthenticatedUser>) -> Json<UserPublic> {
    Json(user.user)
}
