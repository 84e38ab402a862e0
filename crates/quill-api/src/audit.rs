//! Security audit logging for authentication events
//!
//! Registrations, logins, logouts, token refreshes and rejected access
//! tokens are logged at INFO level with the "audit" target, making them
//! easy to filter and route to security monitoring systems.
//!
//! Events never carry passwords, tokens or hashes.
//!
//! # Example
//!
//! ```ignore
//! use quill_api::audit::{AuditContext, AuditEvent, audit_log};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: user.id,
//!     username: user.username.clone(),
//!     context: AuditContext::from_headers(&headers),
//! });
//! ```
//!
//! Author: hephaex@gmail.com

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Request metadata attached to every audit event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditContext {
    /// Client IP address (from proxy headers)
    pub ip_address: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
}

impl AuditContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Security audit events for authentication and authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful user registration
    RegistrationSuccess {
        user_id: Uuid,
        username: String,
        context: AuditContext,
    },

    /// Failed registration attempt
    RegistrationFailure {
        username: String,
        reason: String,
        context: AuditContext,
    },

    /// Successful user login
    LoginSuccess {
        user_id: Uuid,
        username: String,
        context: AuditContext,
    },

    /// Failed login attempt
    LoginFailure {
        username: String,
        reason: String,
        context: AuditContext,
    },

    /// User logout (refresh token invalidated)
    Logout {
        user_id: Uuid,
        username: String,
        context: AuditContext,
    },

    /// Token pair rotated through a refresh token
    TokenRefresh {
        user_id: Uuid,
        username: String,
        context: AuditContext,
    },

    /// Refresh attempt with an absent or stale refresh token
    RefreshDenied {
        user_id: Uuid,
        reason: String,
        context: AuditContext,
    },

    /// Invalid, expired or orphaned access token
    InvalidToken {
        reason: String,
        context: AuditContext,
    },
}

/// Log a security audit event with structured fields
///
/// The full event is also serialized to JSON for log aggregators.
pub fn audit_log(event: &AuditEvent) {
    let timestamp: DateTime<Utc> = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::RegistrationSuccess {
            user_id,
            username,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                ip_address = ?context.ip_address,
                "Registration successful"
            );
        }
        AuditEvent::RegistrationFailure {
            username,
            reason,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                ip_address = ?context.ip_address,
                "Registration failed"
            );
        }
        AuditEvent::LoginSuccess {
            user_id,
            username,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                ip_address = ?context.ip_address,
                "Login successful"
            );
        }
        AuditEvent::LoginFailure {
            username,
            reason,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                ip_address = ?context.ip_address,
                "Login failed"
            );
        }
        AuditEvent::Logout {
            user_id,
            username,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                ip_address = ?context.ip_address,
                "User logout"
            );
        }
        AuditEvent::TokenRefresh {
            user_id,
            username,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                ip_address = ?context.ip_address,
                "Token refresh"
            );
        }
        AuditEvent::RefreshDenied {
            user_id,
            reason,
            context,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                reason = %reason,
                ip_address = ?context.ip_address,
                "Token refresh denied"
            );
        }
        AuditEvent::InvalidToken { reason, context } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                reason = %reason,
                ip_address = ?context.ip_address,
                "Invalid token"
            );
        }
    }
}

/// Extract IP address from request headers
///
/// Checks X-Forwarded-For, then X-Real-IP.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    // Take the first IP in the chain (client IP)
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(first_ip) = xff_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

/// Extract user agent from request headers
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> AuditContext {
        AuditContext {
            ip_address: Some("192.168.1.1".to_string()),
            user_agent: Some("Test Agent".to_string()),
        }
    }

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::LoginSuccess {
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            context: context(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("login_success"));
        assert!(json.contains("alice"));
        assert!(json.contains("192.168.1.1"));
    }

    #[test]
    fn test_audit_log_all_events() {
        // Only ensures logging never panics
        let user_id = Uuid::new_v4();
        let events = vec![
            AuditEvent::RegistrationSuccess {
                user_id,
                username: "alice".to_string(),
                context: context(),
            },
            AuditEvent::RegistrationFailure {
                username: "alice".to_string(),
                reason: "conflict".to_string(),
                context: AuditContext::default(),
            },
            AuditEvent::LoginFailure {
                username: "alice".to_string(),
                reason: "invalid credentials".to_string(),
                context: context(),
            },
            AuditEvent::Logout {
                user_id,
                username: "alice".to_string(),
                context: context(),
            },
            AuditEvent::TokenRefresh {
                user_id,
                username: "alice".to_string(),
                context: context(),
            },
            AuditEvent::RefreshDenied {
                user_id,
                reason: "stale refresh token".to_string(),
                context: context(),
            },
            AuditEvent::InvalidToken {
                reason: "Token has expired".to_string(),
                context: context(),
            },
        ];

        for event in &events {
            audit_log(event);
        }
    }

    #[test]
    fn test_extract_ip_from_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.1, 198.51.100.1".parse().unwrap(),
        );

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_extract_ip_from_x_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "203.0.113.1".parse().unwrap());

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::USER_AGENT,
            "Mozilla/5.0 (Test)".parse().unwrap(),
        );

        let context = AuditContext::from_headers(&headers);
        assert_eq!(context.user_agent.as_deref(), Some("Mozilla/5.0 (Test)"));
        assert_eq!(context.ip_address, None);
    }
}
