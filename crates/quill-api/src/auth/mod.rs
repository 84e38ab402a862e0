//! Authentication and authorization module
//!
//! This module provides JWT-based authentication with the following components:
//! - Password and refresh-token hashing with Argon2
//! - Access/refresh token issuing and verification
//! - Refresh token rotation and invalidation
//! - Authentication service (register, login, logout, refresh)
//! - Middleware for request authentication
//! - Input validation

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod refresh;
pub mod service;
pub mod validation;

pub use jwt::{Claims, JwtConfig, JwtError, TokenIssuer, TokenKind, TokenPair};
pub use middleware::{
    auth_middleware, extract_bearer_token, AuthError, AuthenticatedUser, RequestAuthorizer,
};
pub use password::{verify_password, PasswordConfig, PasswordError};
pub use refresh::{RefreshStoreError, RefreshTokenStore};
pub use service::{AuthResponse, AuthService, LoginRequest, RefreshRequest, RegisterRequest};
pub use validation::{validate_input, FieldViolation};
