//! Error types of the marketplace API

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::constraints;
use crate::validation::FieldError;

/// Error returned by every handler and service operation
#[derive(Error, Debug)]
pub enum ApiError {
    /// One or more fields of the request failed validation
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// A unique value (mobile, custom URL) is already taken
    #[error("{0}")]
    Conflict(String),

    #[error("Invalid or expired OTP")]
    InvalidOtp,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not verified")]
    NotVerified,

    /// Another booking already occupies the requested time
    #[error("Time slot is no longer available")]
    SlotUnavailable,

    #[error("Too many attempts, try again later")]
    TooManyAttempts,

    #[error("Internal server error")]
    InternalServerError,

    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl ApiError {
    /// Validation failure on a single field
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) | ApiError::InvalidOtp => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotVerified => StatusCode::FORBIDDEN,
            ApiError::SlotUnavailable => StatusCode::CONFLICT,
            ApiError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalServerError | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation { constraint } => {
                let message = match constraint.as_str() {
                    constraints::USERS_MOBILE => "Mobile number already registered",
                    constraints::PROFILES_CUSTOM_URL => "Custom URL already taken",
                    constraints::PROFILES_USER_ID => "Profile already exists",
                    _ => "Resource already exists",
                };
                ApiError::Conflict(message.to_string())
            }
            other => ApiError::Database(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::Validation(details) => json!({
                "error": "Validation failed",
                "details": details,
            }),
            ApiError::Database(ref err) => {
                error!("Database error: {}", err);
                json!({ "error": "Internal server error" })
            }
            ApiError::InternalServerError => {
                error!("Internal server error");
                json!({ "error": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
