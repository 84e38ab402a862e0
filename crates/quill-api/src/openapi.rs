//! OpenAPI document for the auth endpoints

use crate::auth::{AuthResponse, FieldViolation, LoginRequest, RefreshRequest, RegisterRequest};
use crate::error::ApiError;
use crate::handlers::health::HealthResponse;
use quill_core::UserPublic;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quill API",
        description = "Authentication for the Quill blog backend.\n\nProtected endpoints expect `Authorization: Bearer <accessToken>`."
    ),
    paths(
        crate::handlers::auth::register_handler,
        crate::handlers::auth::login_handler,
        crate::handlers::auth::refresh_handler,
        crate::handlers::auth::logout_handler,
        crate::handlers::auth::me_handler,
        crate::handlers::health::health_check,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        RefreshRequest,
        AuthResponse,
        UserPublic,
        ApiError,
        FieldViolation,
        HealthResponse
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login and token lifecycle"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_auth_paths() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();

        for path in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/refresh",
            "/api/auth/logout",
            "/api/auth/me",
        ] {
            assert!(json["paths"].get(path).is_some(), "missing {path}");
        }
        assert!(json["components"]["securitySchemes"]
            .get("bearer_auth")
            .is_some());
    }
}
