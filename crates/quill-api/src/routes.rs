//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::auth::middleware::auth_middleware;
use crate::handlers::auth;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create auth routes
///
/// `logout`, `refresh` and `me` sit behind the access-token guard.
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/refresh", post(auth::refresh_handler))
        .route("/auth/me", get(auth::me_handler))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Mount `routes` under `/{prefix}`, or at the root for an empty prefix
pub fn with_prefix(prefix: &str, routes: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        Router::new().merge(routes)
    } else {
        Router::new().nest(&format!("/{prefix}"), routes)
    }
}
