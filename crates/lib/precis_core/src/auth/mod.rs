//! Authentication and authorization logic.
//!
//! Token issuance/validation with a per-user invalidation watermark,
//! password hashing, OTP flows, and the user database queries shared by
//! `precis_api`.

pub mod jwt;
pub mod otp;
pub mod password;
pub mod queries;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token signature/structure failure, including tampering and wrong
    /// algorithm.
    #[error("Malformed token")]
    Malformed,

    #[error("Token has expired")]
    Expired,

    /// Token predates the subject's invalidation watermark.
    #[error("Token has been revoked")]
    Revoked,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("OTP does not match")]
    OtpMismatch,

    #[error("OTP has expired")]
    OtpExpired,

    #[error("User not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
