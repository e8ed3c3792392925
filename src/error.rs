// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent invocation responses.
//!
//! Every variant maps to the status code the dispatcher uses to decide
//! between retrying, surfacing the problem to the tenant, or giving up.

use crate::models::InvocationResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Application error type that converts to invocation responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("TikTok not connected")]
    NotConnected,

    /// Token refresh failed; the tenant has to reconnect the account.
    #[error("Token error: {0}. Please reconnect TikTok.")]
    Auth(String),

    /// The account lacks posting permission (wrong account tier).
    #[error("{0}")]
    Permission(String),

    #[error("TikTok posting limit reached ({posts_today}/{limit} posts today). Try again tomorrow.")]
    RateLimited { posts_today: u32, limit: u32 },

    /// Upstream rejected the call; `message` is passed through unmodified.
    #[error("{message}")]
    Platform { code: String, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Envelope code reported by TikTok for an expired or revoked token.
    pub const TIKTOK_TOKEN_INVALID: &'static str = "access_token_invalid";
    /// Envelope code reported when a required scope was not granted.
    pub const TIKTOK_SCOPE_NOT_AUTHORIZED: &'static str = "scope_not_authorized";

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::NotConnected => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Permission(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Platform { .. } | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the caller may retry the same invocation unchanged.
    ///
    /// Auth, permission and quota failures need the tenant (or the clock)
    /// to change something first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Platform { .. } | AppError::Database(_))
    }

    /// Map a non-"ok" upstream envelope code onto the taxonomy.
    pub fn from_platform(code: &str, message: &str) -> Self {
        match code {
            Self::TIKTOK_TOKEN_INVALID => AppError::Auth(message.to_string()),
            Self::TIKTOK_SCOPE_NOT_AUTHORIZED => AppError::Permission(message.to_string()),
            _ => AppError::Platform {
                code: code.to_string(),
                message: if message.is_empty() {
                    format!("TikTok API error: {}", code)
                } else {
                    message.to_string()
                },
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
            }
            AppError::Platform { code, message } => {
                tracing::error!(code = %code, error = %message, "TikTok API error");
            }
            _ => {}
        }

        let status = self.status_code();
        (status, Json(InvocationResponse::from_error(&self))).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Auth("no refresh token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Permission("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::RateLimited {
                posts_today: 10,
                limit: 10
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::from_platform("invalid_params", "bad title").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_platform_message_passthrough() {
        let err = AppError::from_platform("spam_risk_too_many_posts", "Daily post cap reached");
        assert_eq!(err.to_string(), "Daily post cap reached");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_platform_codes_mapped() {
        assert!(matches!(
            AppError::from_platform("access_token_invalid", "expired"),
            AppError::Auth(_)
        ));
        assert!(matches!(
            AppError::from_platform("scope_not_authorized", "missing video.publish"),
            AppError::Permission(_)
        ));
    }

    #[test]
    fn test_only_transient_errors_retryable() {
        assert!(!AppError::Auth("x".into()).is_retryable());
        assert!(!AppError::RateLimited {
            posts_today: 10,
            limit: 10
        }
        .is_retryable());
        assert!(!AppError::NotConnected.is_retryable());
        assert!(AppError::Database("down".into()).is_retryable());
    }
}
