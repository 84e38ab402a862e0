//! Security headers middleware
//!
//! Adds security headers to every HTTP response. Auth responses carry
//! bearer tokens, so caching is disabled as well.
//!
//! Author: hephaex@gmail.com

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Headers set on every response, overwriting handler values
const SECURITY_HEADERS: &[(&str, &str)] = &[
    // Prevent MIME type sniffing
    ("x-content-type-options", "nosniff"),
    // Prevent clickjacking
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    // Enforce HTTPS for 1 year including subdomains
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains",
    ),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("permissions-policy", "geolocation=(), camera=(), microphone=()"),
    // Tokens must never land in shared caches
    ("cache-control", "no-store"),
    ("pragma", "no-cache"),
];

/// Only API responses get the strict CSP; Swagger UI needs inline assets
const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";

/// Security headers middleware
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let is_docs = request.uri().path().starts_with("/swagger-ui");

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in SECURITY_HEADERS {
        headers.insert(
            HeaderName::from_static(*name),
            HeaderValue::from_static(*value),
        );
    }

    if !is_docs {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(API_CSP),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{Request, StatusCode},
        middleware,
        response::IntoResponse,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        async fn ok_handler() -> impl IntoResponse {
            (StatusCode::OK, "test response")
        }

        async fn error_handler() -> impl IntoResponse {
            (StatusCode::UNAUTHORIZED, "denied")
        }

        Router::new()
            .route("/test", get(ok_handler))
            .route("/error", get(error_handler))
            .route("/swagger-ui/index.html", get(ok_handler))
            .layer(middleware::from_fn(security_headers_middleware))
    }

    async fn get_response(uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app().oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_security_headers_added() {
        let response = get_response("/test").await;
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        for (name, value) in SECURITY_HEADERS {
            assert_eq!(headers.get(*name).unwrap(), *value, "header {name}");
        }
        assert_eq!(headers.get(header::CONTENT_SECURITY_POLICY).unwrap(), API_CSP);
    }

    #[tokio::test]
    async fn test_security_headers_on_error_response() {
        let response = get_response("/error").await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
        assert!(response.headers().get(header::X_FRAME_OPTIONS).is_some());
    }

    #[tokio::test]
    async fn test_docs_skip_strict_csp() {
        let response = get_response("/swagger-ui/index.html").await;

        assert!(response
            .headers()
            .get(header::CONTENT_SECURITY_POLICY)
            .is_none());
        assert!(response
            .headers()
            .get(header::X_CONTENT_TYPE_OPTIONS)
            .is_some());
    }
}
