//! API error handling
//!
//! Author: hephaex@gmail.com

use crate::auth::validation::FieldViolation;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Per-field validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<FieldViolation>>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            violations: None,
        }
    }

    pub fn with_violations(mut self, violations: Vec<FieldViolation>) -> Self {
        self.violations = Some(violations);
        self
    }

    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        Self::new("VALIDATION_ERROR", "Input validation failed").with_violations(violations)
    }

    pub fn conflict() -> Self {
        Self::new("CONFLICT", "User already exists")
    }

    pub fn invalid_credentials() -> Self {
        Self::new("INVALID_CREDENTIALS", "Invalid credentials")
    }

    pub fn access_denied() -> Self {
        Self::new("ACCESS_DENIED", "Access Denied")
    }

    pub fn unauthenticated() -> Self {
        Self::new("UNAUTHENTICATED", "Authentication required")
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
///
/// Everything but `Internal` is a terminal, user-facing outcome.
/// `Internal` covers store and signer faults; its detail is logged and
/// never sent to the client.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0:?}")]
    Validation(Vec<FieldViolation>),

    #[error("User already exists")]
    Conflict,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access denied")]
    AccessDenied,

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied => StatusCode::FORBIDDEN,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::Validation(violations) => ApiError::validation(violations),
            AppError::Conflict => ApiError::conflict(),
            AppError::InvalidCredentials => ApiError::invalid_credentials(),
            AppError::AccessDenied => ApiError::access_denied(),
            AppError::Unauthenticated => ApiError::unauthenticated(),
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                ApiError::internal_error()
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(vec![FieldViolation {
            field: "body".to_string(),
            message: rejection.body_text(),
        }])
    }
}

impl From<quill_core::StoreError> for AppError {
    fn from(err: quill_core::StoreError) -> Self {
        use quill_core::StoreError;

        match err {
            StoreError::Conflict(_) => AppError::Conflict,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<crate::auth::PasswordError> for AppError {
    fn from(err: crate::auth::PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::auth::JwtError> for AppError {
    fn from(err: crate::auth::JwtError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::auth::RefreshStoreError> for AppError {
    fn from(err: crate::auth::RefreshStoreError) -> Self {
        use crate::auth::RefreshStoreError;

        match err {
            RefreshStoreError::Store(e) => e.into(),
            RefreshStoreError::Hash(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::{FromRequest, Request};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_codes() {
        let cases = vec![
            (AppError::Validation(vec![]), StatusCode::BAD_REQUEST),
            (AppError::Conflict, StatusCode::CONFLICT),
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AppError::AccessDenied, StatusCode::FORBIDDEN),
            (AppError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                AppError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response =
            AppError::Internal("connection refused at 10.0.0.5:5432".to_string()).into_response();
        let json = body_json(response).await;

        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert!(!json.to_string().contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let response = AppError::Validation(vec![FieldViolation {
            field: "email".to_string(),
            message: "email must be an email".to_string(),
        }])
        .into_response();
        let json = body_json(response).await;

        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["violations"][0]["field"], "email");
    }

    #[test]
    fn test_store_conflict_maps_to_conflict() {
        let err: AppError = quill_core::StoreError::Conflict("email".to_string()).into();
        assert!(matches!(err, AppError::Conflict));

        let err: AppError = quill_core::StoreError::Database("down".to_string()).into();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_conflict_does_not_name_field() {
        let err: AppError = quill_core::StoreError::Conflict("username".to_string()).into();
        let json = body_json(err.into_response()).await;

        assert_eq!(json["code"], "CONFLICT");
        assert!(!json.to_string().contains("username"));
    }

    async fn json_rejection(content_type: Option<&str>, body: &str) -> JsonRejection {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        Json::<crate::auth::RegisterRequest>::from_request(request, &())
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn test_json_rejections_become_body_violations() {
        let cases = vec![
            (Some("application/json"), r#"{"email":"a@x.com"}"#, "username"),
            (Some("application/json"), "{not json", ""),
            (None, r#"{"email":"a@x.com"}"#, "Content-Type"),
        ];

        for (content_type, body, hint) in cases {
            let err: AppError = json_rejection(content_type, body).await.into();
            match &err {
                AppError::Validation(violations) => {
                    assert_eq!(violations.len(), 1);
                    assert_eq!(violations[0].field, "body");
                    assert!(violations[0].message.contains(hint));
                }
                other => panic!("expected validation error, got {other:?}"),
            }
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }
}
