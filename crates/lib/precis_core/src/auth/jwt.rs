//! JWT token issuance, validation, and identity resolution.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sqlx::PgPool;
use tracing::info;

use super::AuthError;
use crate::models::auth::{TokenClaims, User};

/// Sign a token for `subject` issued at the supplied instant (HS256).
///
/// The issuance time is caller-supplied rather than captured internally so
/// that watermark comparisons are reproducible and refresh issuance can reuse
/// this path with a fresh timestamp.
pub fn issue_token(
    subject: &str,
    issued_at: DateTime<Utc>,
    expiry_secs: i64,
    secret: &[u8],
) -> Result<String, AuthError> {
    let claims = TokenClaims {
        sub: subject.to_string(),
        iat: issued_at.timestamp(),
        exp: issued_at.timestamp() + expiry_secs,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

/// Verify signature and expiry, returning the claims on success.
///
/// Fails `Expired` once the current time reaches the expiry claim, and
/// `Malformed` for any structural or signature failure.
pub fn validate_token(token: &str, secret: &[u8]) -> Result<TokenClaims, AuthError> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    let claims = match decode::<TokenClaims>(token, &key, &validation) {
        Ok(data) => data.claims,
        Err(e) => {
            return match e.kind() {
                ErrorKind::ExpiredSignature => Err(AuthError::Expired),
                _ => Err(AuthError::Malformed),
            };
        }
    };
    // The library only rejects once exp < now; the expiry instant itself is
    // already past the token's lifetime.
    if Utc::now().timestamp() >= claims.exp {
        return Err(AuthError::Expired);
    }
    Ok(claims)
}

/// Whether a token issued at `issued_at` (unix secs) predates the watermark.
pub fn issued_before_watermark(issued_at: i64, watermark: Option<DateTime<Utc>>) -> bool {
    watermark.is_some_and(|w| issued_at < w.timestamp())
}

/// Validate a token and resolve it to a stored user.
///
/// Fails `NotFound` when the subject no longer exists and `Revoked` when the
/// token was issued before the user's invalidation watermark (set on password
/// reset).
pub async fn resolve_identity(
    pool: &PgPool,
    token: &str,
    secret: &[u8],
) -> Result<User, AuthError> {
    let claims = validate_token(token, secret)?;
    let user = super::queries::find_user_by_email(pool, &claims.sub)
        .await?
        .ok_or(AuthError::NotFound)?;
    if issued_before_watermark(claims.iat, user.token_invalidated_at) {
        return Err(AuthError::Revoked);
    }
    Ok(user)
}

/// Resolve the JWT secret: env var `JWT_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    // Generate and persist
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new JWT secret");
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("precis")
        .join("jwt-secret")
}
