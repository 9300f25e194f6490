//! Unified error handling for Clinica Core

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// No tenant could be resolved for the request, or the resolved
    /// identifier denotes no existing tenant.
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    /// The tenant exists but is not accessible (deactivated, expired or
    /// cancelled subscription). Distinct from `TenantNotFound` so callers
    /// can message the difference, but both are terminal for the request.
    #[error("Tenant inactive: {0}")]
    TenantInactive(String),

    /// Authorization denial. Carries a stable machine-readable code of the
    /// form `forbidden:{ability}`.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed domain or capability declarations. Fatal at startup,
    /// never produced on a per-request path.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::TenantNotFound(msg) => {
                (StatusCode::NOT_FOUND, "tenant_not_found".to_string(), msg.clone())
            }
            AppError::TenantInactive(msg) => {
                (StatusCode::FORBIDDEN, "tenant_inactive".to_string(), msg.clone())
            }
            AppError::Forbidden(code) => (
                StatusCode::FORBIDDEN,
                code.clone(),
                "You are not allowed to perform this action".to_string(),
            ),
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, "not_found".to_string(), msg.clone())
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request".to_string(), msg.clone())
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, "conflict".to_string(), msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation".to_string(), msg.clone())
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error".to_string(),
                    "A configuration error occurred".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error".to_string(),
                    "A database error occurred".to_string(),
                )
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "cache_error".to_string(),
                    "A cache error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error".to_string(),
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type,
            message,
        });

        (status, body).into_response()
    }
}

impl AppError {
    /// Build the stable denial error for an ability, e.g. `forbidden:delete_patients`.
    pub fn forbidden_ability(ability: &str) -> Self {
        AppError::Forbidden(format!("forbidden:{ability}"))
    }
}

// Conversion from validation errors
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}
