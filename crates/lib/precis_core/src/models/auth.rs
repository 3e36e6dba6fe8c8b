//! Authentication domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub salt: String,
    /// Personal LLM API key; when set, submissions bypass quota accounting.
    pub openai_key: Option<String>,
    /// Remaining free-trial quota in characters. Never goes negative.
    pub quota: i64,
    /// Pending password-recovery OTP, if any.
    pub recovery_otp: Option<String>,
    pub recovery_otp_expires_at: Option<DateTime<Utc>>,
    /// Invalidation watermark: tokens issued before this instant are revoked.
    pub token_invalidated_at: Option<DateTime<Utc>>,
}

/// A registration awaiting OTP verification. Promoted to `User` on success.
#[derive(Debug, Clone)]
pub struct PotentialUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub salt: String,
    pub otp: String,
    pub otp_sent_at: DateTime<Utc>,
}

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject, the user email.
    pub sub: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}
