//! Centralized API error handling
//!
//! This module provides a unified error type for API responses with proper
//! HTTP status code mapping and JSON error responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::{AuthError, SessionError};

/// Client-facing message for every nonce or signature failure
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::TooManyRequests(_) => "RATE_LIMITED",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client
    fn public_message(&self) -> String {
        match self {
            // Internal details stay in the logs
            ApiError::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Log server errors
        match &self {
            ApiError::InternalError(_) => {
                tracing::error!(error = %self, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %self, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::InvalidAddress(e) => ApiError::BadRequest(e.to_string()),
            AuthError::NonceNotFound
            | AuthError::NonceExpired
            | AuthError::InvalidSignature(_)
            | AuthError::SignatureMismatch { .. } => {
                tracing::warn!(kind = err.kind(), error = %err, "Wallet authentication rejected");
                ApiError::Unauthorized(AUTHENTICATION_FAILED.to_string())
            }
            AuthError::Directory(_) | AuthError::Session(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match &err {
            SessionError::EncodingFailed(_) => ApiError::InternalError(err.to_string()),
            SessionError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
            SessionError::DecodingFailed(_) | SessionError::InvalidToken(_) => {
                ApiError::Unauthorized("Invalid token".to_string())
            }
        }
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{canonicalize, CryptoError, DirectoryError};

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            ApiError::BadRequest("test".to_string()).error_code(),
            "BAD_REQUEST"
        );
        assert_eq!(
            ApiError::Unauthorized("test".to_string()).error_code(),
            "UNAUTHORIZED"
        );
    }

    #[test]
    fn test_rate_limited_status() {
        let err = ApiError::TooManyRequests("slow down".to_string());
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.error_code(), "RATE_LIMITED");
    }

    #[test]
    fn test_auth_failures_are_indistinguishable() {
        let claimed = canonicalize("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();
        let recovered = canonicalize("0x70997970c51812dc3a010c7d01b50e0d17dc79c8").unwrap();

        let errors = vec![
            AuthError::NonceNotFound,
            AuthError::NonceExpired,
            AuthError::InvalidSignature(CryptoError::InvalidRecoveryId(5)),
            AuthError::SignatureMismatch { claimed, recovered },
        ];

        for err in errors {
            let api_error = ApiError::from(err);
            assert_eq!(api_error.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(api_error.public_message(), "Unauthorized: Authentication failed");
        }
    }

    #[test]
    fn test_invalid_address_is_bad_request() {
        let err = canonicalize("0x12").unwrap_err();
        let api_error = ApiError::from(AuthError::InvalidAddress(err));
        assert_eq!(api_error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AuthError::Directory(DirectoryError::DatabaseError("pool timed out".to_string()));
        let api_error = ApiError::from(err);

        assert_eq!(api_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api_error.public_message().contains("pool"));
    }
}
