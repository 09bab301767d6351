//! Error types for the Bookshelf server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Book lifecycle precondition failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Book not found")]
    BookNotFound,

    #[error("User already has an active reservation or borrowing")]
    AlreadyBorrowing,

    #[error("Book is not available")]
    NotAvailable,

    #[error("Book is not reserved")]
    NotReserved,

    #[error("Book is reserved by another user")]
    ReservedByAnotherUser,

    #[error("No open borrowing found for this user and book")]
    NoOpenBorrowing,

    #[error("Book state is inconsistent: {0}")]
    Inconsistent(String),
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

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// HTTP status code
    pub code: u16,
    /// Always `"error"`
    pub status: &'static str,
    pub message: String,
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Authorization(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) | AppError::BadRequest(msg) | AppError::Conflict(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Identity(msg) => {
                tracing::error!("Identity provider error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Identity provider unavailable".to_string())
            }
            AppError::Lifecycle(e) => match e {
                LifecycleError::BookNotFound | LifecycleError::NoOpenBorrowing => {
                    (StatusCode::NOT_FOUND, e.to_string())
                }
                LifecycleError::Inconsistent(detail) => {
                    tracing::error!("Lifecycle inconsistency: {}", detail);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
                }
                _ => (StatusCode::BAD_REQUEST, e.to_string()),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            status: "error",
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
