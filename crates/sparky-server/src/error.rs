//! API error types.
//!
//! Maps authentication and identity errors to HTTP responses with a JSON
//! body `{error, error_description}`.

use axum::{
    Json,
    http::{StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sparky_auth::{AuthError, IdentityError};
use thiserror::Error;

/// Errors returned by the REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, invalid or unresolvable authentication.
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Target user or realm not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Well-formed request with unusable values.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The user store is unreachable.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::BadRequest(_) => "bad_request",
            Self::Validation(_) => "validation_error",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::IdentityNotFound
            | IdentityError::MissingData(_)
            | IdentityError::AmbiguousRole { .. }
            | IdentityError::InvalidRole(_) => Self::Unauthorized(err.to_string()),
            IdentityError::UserNotFound(_) => Self::NotFound(err.to_string()),
            IdentityError::UniquenessViolation { .. } => Self::Conflict(err.to_string()),
            IdentityError::StorageUnavailable(_) => Self::ServiceUnavailable(err.to_string()),
            IdentityError::UnsupportedRealm(_)
            | IdentityError::InvalidIdentity(_)
            | IdentityError::NotPersistable(_)
            | IdentityError::ImmutableCredential(_) => Self::Validation(err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::UserDisabled
            | AuthError::UserExpired
            | AuthError::UserLocked
            | AuthError::InvalidToken(_) => Self::Unauthorized(err.to_string()),
            AuthError::AccessDenied(reason) => Self::Forbidden(reason),
            AuthError::WeakPassword(_) => Self::Validation(err.to_string()),
            AuthError::Identity(inner) => inner.into(),
            AuthError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error: String,
    /// Human-readable error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let description = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed with internal error");
                None
            }
            _ => Some(self.to_string()),
        };
        let body = ErrorResponse {
            error: self.error_code().to_string(),
            error_description: description,
        };

        if status == StatusCode::UNAUTHORIZED {
            (status, [(WWW_AUTHENTICATE, "Bearer")], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
