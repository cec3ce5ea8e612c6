//! Error types for GymSlots server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric codes carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    StorageFailure = 3,
    NotFound = 4,
    InvalidReference = 5,
    InvalidSlot = 6,
    SlotConflict = 7,
    DuplicateKey = 8,
    BadValue = 9,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    /// Every requested slot that is already taken, as "HH:MM" labels
    #[error("Slot conflict: {}", slots.join(", "))]
    SlotConflict { slots: Vec<String> },

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Authentication(_) | AppError::Authorization(_) => ErrorCode::NotAuthorized,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::InvalidReference(_) => ErrorCode::InvalidReference,
            AppError::InvalidSlot(_) => ErrorCode::InvalidSlot,
            AppError::SlotConflict { .. } => ErrorCode::SlotConflict,
            AppError::DuplicateKey(_) => ErrorCode::DuplicateKey,
            AppError::Validation(_) | AppError::BadRequest(_) => ErrorCode::BadValue,
            AppError::Database(_) => ErrorCode::StorageFailure,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidReference(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidSlot(_) | AppError::Validation(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::SlotConflict { .. } | AppError::DuplicateKey(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Classify a storage error raised by a write.
///
/// Unique violations on the client identity keys become `DuplicateKey` and
/// foreign-key violations become `InvalidReference`. Anything else stays a
/// storage failure. Slot uniqueness is handled by the booking path itself
/// because it needs to know which slot collided.
pub fn classify_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("clients_national_id_key") => {
                    return AppError::DuplicateKey("National ID already registered".to_string())
                }
                Some("clients_email_lower_key") => {
                    return AppError::DuplicateKey("Email already registered".to_string())
                }
                _ => {}
            }
        }
        if db_err.is_foreign_key_violation() {
            return AppError::InvalidReference(db_err.message().to_string());
        }
    }
    AppError::Database(err)
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Conflicting slot labels (only for SlotConflict)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::SlotConflict { slots } => {
                format!("Slots already taken: {}", slots.join(", "))
            }
            AppError::Authentication(msg)
            | AppError::Authorization(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidReference(msg)
            | AppError::InvalidSlot(msg)
            | AppError::DuplicateKey(msg)
            | AppError::Validation(msg)
            | AppError::BadRequest(msg) => msg.clone(),
        };

        let conflicts = match self {
            AppError::SlotConflict { slots } => Some(slots),
            _ => None,
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            conflicts,
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
