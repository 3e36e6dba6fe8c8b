//! Authentication service: registration, OTP verification, login, and
//! password recovery flows.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::info;

use precis_core::auth::otp::{Mailer, generate_otp};
use precis_core::auth::password::{SALT_LENGTH, generate_salt, hash_password, verify_password};
use precis_core::auth::{AuthError, jwt, queries};
use precis_core::config::AppConfig;
use precis_core::models::auth::User;

use crate::error::{AppError, AppResult};
use crate::models::{OtpSentResponse, RefreshResponse, TokenResponse};

fn otp_sent_response(expiry_in: i64) -> OtpSentResponse {
    OtpSentResponse {
        message: "OTP verification sent successfully!".to_string(),
        expiry_in,
    }
}

/// Stage a registration and send its OTP.
///
/// A duplicate registration of a verified account is rejected; re-registering
/// a still-pending email refreshes the staged row and OTP.
pub async fn register(
    pool: &PgPool,
    mailer: &dyn Mailer,
    config: &AppConfig,
    email: &str,
    name: &str,
    password: &str,
) -> AppResult<OtpSentResponse> {
    if queries::email_exists(pool, email).await? {
        return Err(AuthError::Conflict("User already exists".into()).into());
    }

    let salt = generate_salt(SALT_LENGTH);
    let digest = hash_password(password, &salt);
    let otp = generate_otp();
    queries::upsert_potential_user(pool, email, name, &digest, &salt, &otp).await?;
    mailer.send_otp(email, &otp)?;

    info!(email, "registration staged, OTP sent");
    Ok(otp_sent_response(config.otp_expiry_secs))
}

/// Issue a fresh OTP for a pending registration.
pub async fn resend_otp(
    pool: &PgPool,
    mailer: &dyn Mailer,
    config: &AppConfig,
    email: &str,
) -> AppResult<OtpSentResponse> {
    let otp = generate_otp();
    if !queries::refresh_potential_otp(pool, email, &otp).await? {
        return Err(AppError::NotFound("No pending registration".into()));
    }
    mailer.send_otp(email, &otp)?;
    Ok(otp_sent_response(config.otp_expiry_secs))
}

/// Verify a registration OTP and promote the staged user.
pub async fn verify(
    pool: &PgPool,
    config: &AppConfig,
    email: &str,
    otp: &str,
) -> AppResult<TokenResponse> {
    let staged = queries::find_potential_user(pool, email)
        .await?
        .ok_or(AuthError::NotFound)?;

    let expires_at = staged.otp_sent_at + Duration::seconds(config.otp_expiry_secs);
    if Utc::now() >= expires_at {
        return Err(AuthError::OtpExpired.into());
    }
    if staged.otp != otp {
        return Err(AuthError::OtpMismatch.into());
    }

    queries::promote_potential_user(pool, &staged, config.free_trial_units).await?;
    info!(email, "user created");

    let token = jwt::issue_token(
        email,
        Utc::now(),
        config.jwt_expiry_secs,
        config.jwt_secret.as_bytes(),
    )?;
    Ok(TokenResponse {
        message: "User created successfully".to_string(),
        jwt_token: token,
    })
}

/// Authenticate with email + password.
pub async fn login(
    pool: &PgPool,
    config: &AppConfig,
    email: &str,
    password: &str,
) -> AppResult<TokenResponse> {
    let user = queries::find_user_by_email(pool, email)
        .await?
        .ok_or(AuthError::NotFound)?;

    if !verify_password(password, &user.salt, &user.password_hash) {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = jwt::issue_token(
        email,
        Utc::now(),
        config.jwt_expiry_secs,
        config.jwt_secret.as_bytes(),
    )?;
    Ok(TokenResponse {
        message: "Login successful".to_string(),
        jwt_token: token,
    })
}

/// Re-issue a token for an already-authenticated caller.
///
/// Issuance goes through the same path as login with a fresh timestamp, so
/// the refreshed token's issuance time never precedes the original's.
pub fn refresh(config: &AppConfig, user: &User) -> AppResult<RefreshResponse> {
    let token = jwt::issue_token(
        &user.email,
        Utc::now(),
        config.jwt_expiry_secs,
        config.jwt_secret.as_bytes(),
    )?;
    Ok(RefreshResponse {
        refresh_token: token,
    })
}

/// Begin password recovery: store an OTP on the user and mail it.
pub async fn forgot_password(
    pool: &PgPool,
    mailer: &dyn Mailer,
    config: &AppConfig,
    email: &str,
) -> AppResult<OtpSentResponse> {
    let otp = generate_otp();
    let expires_at = Utc::now() + Duration::seconds(config.otp_expiry_secs);
    if !queries::set_recovery_otp(pool, email, &otp, expires_at).await? {
        return Err(AuthError::NotFound.into());
    }
    mailer.send_otp(email, &otp)?;
    Ok(otp_sent_response(config.otp_expiry_secs))
}

/// Complete password recovery.
///
/// Sets the invalidation watermark in the same statement as the credential
/// change, so every token issued before the reset instant is revoked. The
/// returned token is issued at that same instant and remains valid.
pub async fn reset_password(
    pool: &PgPool,
    config: &AppConfig,
    email: &str,
    otp: &str,
    new_password: &str,
) -> AppResult<TokenResponse> {
    let user = queries::find_user_by_email(pool, email)
        .await?
        .ok_or(AuthError::NotFound)?;

    let stored_otp = user.recovery_otp.as_deref().ok_or(AuthError::OtpMismatch)?;
    let expires_at = user
        .recovery_otp_expires_at
        .ok_or(AuthError::OtpMismatch)?;
    if Utc::now() >= expires_at {
        return Err(AuthError::OtpExpired.into());
    }
    if stored_otp != otp {
        return Err(AuthError::OtpMismatch.into());
    }

    let salt = generate_salt(SALT_LENGTH);
    let digest = hash_password(new_password, &salt);
    let now = Utc::now();
    queries::reset_password(pool, email, &digest, &salt, now).await?;
    info!(email, "password reset, previous tokens revoked");

    let token = jwt::issue_token(
        email,
        now,
        config.jwt_expiry_secs,
        config.jwt_secret.as_bytes(),
    )?;
    Ok(TokenResponse {
        message: "Password updated successfully".to_string(),
        jwt_token: token,
    })
}
