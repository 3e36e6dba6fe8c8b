//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorResponse;
use precis_core::auth::AuthError;
use precis_core::auth::otp::MailError;
use precis_core::dispatch::DispatchError;
use precis_core::jobs::JobError;
use precis_core::parse::ParseError;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Payment required: {0}")]
    PaymentRequired(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Gone: {0}")]
    Gone(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::PaymentRequired(m) => {
                (StatusCode::PAYMENT_REQUIRED, "payment_required", m.as_str())
            }
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Gone(m) => (StatusCode::GONE, "gone", m.as_str()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error",
            ),
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Malformed => AppError::BadRequest("Malformed token".into()),
            AuthError::Expired => AppError::Gone("Token has expired".into()),
            AuthError::OtpExpired => AppError::Gone("OTP has expired".into()),
            AuthError::Revoked => AppError::Unauthorized("Token has been revoked".into()),
            AuthError::InvalidCredentials => {
                AppError::Unauthorized("Invalid credentials".into())
            }
            AuthError::OtpMismatch => AppError::Unauthorized("OTP does not match".into()),
            AuthError::NotFound => AppError::NotFound("User not found".into()),
            AuthError::Conflict(m) => AppError::BadRequest(m),
            AuthError::Db(e) => AppError::from(e),
            AuthError::Internal(m) => AppError::Internal(m),
        }
    }
}

impl From<JobError> for AppError {
    fn from(e: JobError) -> Self {
        match e {
            JobError::NotFound => AppError::NotFound("Task not found".into()),
            JobError::Unauthorized => {
                AppError::Unauthorized("Not authorized for this task".into())
            }
            JobError::AlreadyFinalized => {
                AppError::BadRequest("Task already finalized".into())
            }
            JobError::Db(e) => AppError::from(e),
        }
    }
}

impl From<ParseError> for AppError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::Unsupported(ext) => {
                AppError::BadRequest(format!("Send a valid supported file type, not '{ext}'"))
            }
            ParseError::Invalid(m) => AppError::BadRequest(m),
        }
    }
}

impl From<DispatchError> for AppError {
    fn from(e: DispatchError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<MailError> for AppError {
    fn from(e: MailError) -> Self {
        AppError::Internal(e.to_string())
    }
}
