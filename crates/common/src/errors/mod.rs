//! Error types for the TenantGrid control plane
//!
//! Provides:
//! - One error enum covering validation, state-machine, storage,
//!   provisioning and transport failure modes
//! - Machine-readable error codes for client handling
//! - HTTP status mapping and the JSON error envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::TenantStatus;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Machine-readable error codes surfaced in API responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation
    ValidationError,
    InvalidId,
    InvalidName,
    InvalidSlug,
    InvalidEmail,
    InvalidPlan,
    InvalidStatus,
    InvalidJson,

    // Authentication / authorization
    Unauthorized,
    Forbidden,

    // Resources
    TenantNotFound,
    NotFound,

    // Conflicts and state machine
    SlugExists,
    AlreadyActive,
    AlreadySuspended,
    AlreadyDeleted,
    PlanUnchanged,
    InvalidTransition,

    // Gone
    TenantDeleted,

    // Infrastructure
    ProvisioningFailed,
    DatabaseError,
    PublishError,
    ConfigurationError,
    SerializationError,
    ServiceUnavailable,

    // Request lifecycle
    RequestCanceled,
    MethodNotAllowed,

    // Catch-all
    InternalError,
}

/// Application error type.
#[derive(Error, Debug)]
pub enum Error {
    // Validation errors
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("invalid tenant id: {0}")]
    InvalidId(String),

    #[error("invalid tenant name: {0}")]
    InvalidName(String),

    #[error("invalid tenant slug: {0}")]
    InvalidSlug(String),

    #[error("invalid contact email: {0}")]
    InvalidEmail(String),

    #[error("unknown plan tier: {0}")]
    InvalidPlan(String),

    #[error("unknown tenant status: {0}")]
    InvalidStatus(String),

    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),

    // Authentication / authorization
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: missing role {0}")]
    Forbidden(String),

    // Resource errors
    #[error("tenant not found")]
    TenantNotFound,

    // Conflict and state-machine errors
    #[error("tenant slug already exists")]
    SlugExists,

    #[error("tenant is already active")]
    AlreadyActive,

    #[error("tenant is already suspended")]
    AlreadySuspended,

    #[error("tenant is already deleted")]
    AlreadyDeleted,

    #[error("tenant already has this plan")]
    PlanUnchanged,

    #[error("illegal status transition from {from} to {to}")]
    InvalidTransition {
        from: TenantStatus,
        to: TenantStatus,
    },

    // Operating on a soft-deleted tenant
    #[error("tenant has been deleted")]
    TenantDeleted,

    // Infrastructure errors
    #[error("schema provisioning failed: {0}")]
    ProvisioningFailed(String),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("event publish failed: {0}")]
    Publish(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    // Request lifecycle
    #[error("request canceled")]
    Canceled,

    // Catch-all
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Validation { .. } => ErrorCode::ValidationError,
            Error::InvalidId(_) => ErrorCode::InvalidId,
            Error::InvalidName(_) => ErrorCode::InvalidName,
            Error::InvalidSlug(_) => ErrorCode::InvalidSlug,
            Error::InvalidEmail(_) => ErrorCode::InvalidEmail,
            Error::InvalidPlan(_) => ErrorCode::InvalidPlan,
            Error::InvalidStatus(_) => ErrorCode::InvalidStatus,
            Error::InvalidJson(_) => ErrorCode::InvalidJson,
            Error::Unauthorized(_) => ErrorCode::Unauthorized,
            Error::Forbidden(_) => ErrorCode::Forbidden,
            Error::TenantNotFound => ErrorCode::TenantNotFound,
            Error::SlugExists => ErrorCode::SlugExists,
            Error::AlreadyActive => ErrorCode::AlreadyActive,
            Error::AlreadySuspended => ErrorCode::AlreadySuspended,
            Error::AlreadyDeleted => ErrorCode::AlreadyDeleted,
            Error::PlanUnchanged => ErrorCode::PlanUnchanged,
            Error::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            Error::TenantDeleted => ErrorCode::TenantDeleted,
            Error::ProvisioningFailed(_) => ErrorCode::ProvisioningFailed,
            Error::Database(_) => ErrorCode::DatabaseError,
            Error::Publish(_) => ErrorCode::PublishError,
            Error::Configuration(_) => ErrorCode::ConfigurationError,
            Error::Serialization(_) => ErrorCode::SerializationError,
            Error::DependencyUnavailable(_) => ErrorCode::ServiceUnavailable,
            Error::Canceled => ErrorCode::RequestCanceled,
            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            Error::Validation { .. }
            | Error::InvalidId(_)
            | Error::InvalidName(_)
            | Error::InvalidSlug(_)
            | Error::InvalidEmail(_)
            | Error::InvalidPlan(_)
            | Error::InvalidStatus(_)
            | Error::InvalidJson(_) => StatusCode::BAD_REQUEST,

            // 401 / 403
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,

            // 404 Not Found
            Error::TenantNotFound => StatusCode::NOT_FOUND,

            // 408 Request Timeout
            Error::Canceled => StatusCode::REQUEST_TIMEOUT,

            // 409 Conflict
            Error::SlugExists
            | Error::AlreadyActive
            | Error::AlreadySuspended
            | Error::AlreadyDeleted
            | Error::PlanUnchanged
            | Error::InvalidTransition { .. } => StatusCode::CONFLICT,

            // 410 Gone
            Error::TenantDeleted => StatusCode::GONE,

            // 500 Internal Server Error
            Error::ProvisioningFailed(_)
            | Error::Database(_)
            | Error::Publish(_)
            | Error::Configuration(_)
            | Error::Serialization(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 503 Service Unavailable
            Error::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Check if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for the API: `{"error": {...}}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code,
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }
}

impl From<axum::extract::rejection::JsonRejection> for Error {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        Error::InvalidJson(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        // Internal details stay out of the response body.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            message
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = Error::TenantNotFound;
        assert_eq!(err.code(), ErrorCode::TenantNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = Error::SlugExists;
        assert_eq!(err.code(), ErrorCode::SlugExists);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = Error::TenantDeleted;
        assert_eq!(err.status_code(), StatusCode::GONE);
    }

    #[test]
    fn test_state_conflicts_are_conflicts() {
        for err in [
            Error::AlreadyActive,
            Error::AlreadySuspended,
            Error::AlreadyDeleted,
            Error::InvalidTransition {
                from: TenantStatus::Provisioning,
                to: TenantStatus::Suspended,
            },
        ] {
            assert_eq!(err.status_code(), StatusCode::CONFLICT);
            assert!(err.is_client_error());
        }
    }

    #[test]
    fn test_error_codes_serialize_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::SlugExists).unwrap();
        assert_eq!(json, "\"SLUG_EXISTS\"");
        let json = serde_json::to_string(&ErrorCode::AlreadyActive).unwrap();
        assert_eq!(json, "\"ALREADY_ACTIVE\"");
        let json = serde_json::to_string(&ErrorCode::TenantDeleted).unwrap();
        assert_eq!(json, "\"TENANT_DELETED\"");
        let json = serde_json::to_string(&ErrorCode::InvalidSlug).unwrap();
        assert_eq!(json, "\"INVALID_SLUG\"");
    }

    #[test]
    fn test_validation_error() {
        let err = Error::Validation {
            message: "slug too long".into(),
            field: Some("slug".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_server_error() {
        let err = Error::Internal("boom".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_server_error());
    }
}
