//! Error Types for the Planforge API
//!
//! This module defines error handling for the HTTP layer:
//! - ApiError struct carrying a code and a caller-visible message
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation emitting `{"error": message}`
//!
//! Core error kinds convert into ApiError with their HTTP status. Internal
//! details (database failures, provider reasons) are logged, not returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use planforge_core::{
    ConfigError, GenerationError, PersistenceError, PlanforgeError, StorageError,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code and names the stage
/// of the request that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401)
    // ========================================================================
    /// No authenticated caller
    Unauthorized,

    /// Authentication token is invalid or malformed
    InvalidToken,

    /// Authentication token has expired
    TokenExpired,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Field format is incorrect
    InvalidFormat,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested entity does not exist
    EntityNotFound,

    // ========================================================================
    // Server Errors (500)
    // ========================================================================
    /// The image provider failed or returned nothing usable
    GenerationFailed,

    /// The persist-link-audit transaction was rolled back
    PersistenceFailed,

    /// Internal server error
    InternalError,

    /// Database operation failed
    DatabaseError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized | ErrorCode::InvalidToken | ErrorCode::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }

            ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,

            ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,

            ErrorCode::GenerationFailed
            | ErrorCode::PersistenceFailed
            | ErrorCode::InternalError
            | ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Unauthorized",
            ErrorCode::InvalidToken => "Invalid authentication token",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::GenerationFailed => "Failed to generate floor plan",
            ErrorCode::PersistenceFailed => "Failed to save floor plan",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database operation failed",
        }
    }

    /// Metric label for the generation outcome counter.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized | ErrorCode::InvalidToken | ErrorCode::TokenExpired => {
                "authentication"
            }
            ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => "validation",
            ErrorCode::EntityNotFound => "not_found",
            ErrorCode::GenerationFailed => "generation",
            ErrorCode::PersistenceFailed => "persistence",
            ErrorCode::InternalError | ErrorCode::DatabaseError => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Error returned by every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message returned to the caller
    pub message: String,
}

/// Wire shape of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, message)
    }

    pub fn token_expired() -> Self {
        Self::from_code(ErrorCode::TokenExpired)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// Create an InvalidFormat error.
    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("{} must be {}", field, expected),
        )
    }

    /// Create an EntityNotFound error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EntityNotFound, message)
    }

    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GenerationFailed, message)
    }

    pub fn persistence_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PersistenceFailed, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

/// Lets handlers return `Result<_, ApiError>` directly.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorBody {
            error: self.message,
        });
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM CORE ERRORS
// ============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation_failed(err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity, .. } => {
                ApiError::not_found(format!("{} not found", capitalize(&entity.to_string())))
            }
            other => {
                tracing::error!(error = %other, "Storage error");
                ApiError::database_error("Database operation failed")
            }
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        tracing::error!(error = %err, "Image generation failed");
        let message = match &err {
            GenerationError::Timeout { .. } => "Floor plan generation timed out".to_string(),
            GenerationError::MissingImageReference { .. } => {
                "Failed to generate floor plan: no image returned".to_string()
            }
            _ => ErrorCode::GenerationFailed.default_message().to_string(),
        };
        ApiError::generation_failed(message)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        tracing::error!(error = %err, "Floor plan persistence rolled back");
        let message = match &err {
            PersistenceError::ProjectNotFoundDuringLink { .. }
            | PersistenceError::LinkUpdateNoEffect { .. }
            | PersistenceError::AmbiguousLink { .. } => {
                format!("{}: {}", ErrorCode::PersistenceFailed.default_message(), err)
            }
            _ => ErrorCode::PersistenceFailed.default_message().to_string(),
        };
        ApiError::persistence_failed(message)
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        tracing::error!(error = %err, "Configuration error");
        ApiError::internal_error(err.to_string())
    }
}

impl From<PlanforgeError> for ApiError {
    fn from(err: PlanforgeError) -> Self {
        match err {
            PlanforgeError::Validation(e) => e.into(),
            PlanforgeError::Storage(e) => e.into(),
            PlanforgeError::Generation(e) => e.into(),
            PlanforgeError::Persistence(e) => e.into(),
            PlanforgeError::Config(e) => e.into(),
        }
    }
}

/// Convert from serde_json::Error (unparseable request bodies).
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::validation_failed(format!("Invalid JSON: {}", err))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
