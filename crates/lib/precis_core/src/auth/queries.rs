//! User and registration-staging database queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::AuthError;
use crate::models::auth::{PotentialUser, User};

type UserRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    i64,
    Option<String>,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
);

fn user_from_row(row: UserRow) -> User {
    let (
        email,
        name,
        password_hash,
        salt,
        openai_key,
        quota,
        recovery_otp,
        recovery_otp_expires_at,
        token_invalidated_at,
    ) = row;
    User {
        email,
        name,
        password_hash,
        salt,
        openai_key,
        quota,
        recovery_otp,
        recovery_otp_expires_at,
        token_invalidated_at,
    }
}

/// Fetch a user by email.
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT email, name, password_hash, salt, openai_key, quota, \
                recovery_otp, recovery_otp_expires_at, token_invalidated_at \
         FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(user_from_row))
}

/// Check whether an email is already registered.
pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AuthError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Stage a registration pending OTP verification.
///
/// Re-registering a pending email refreshes the staged row and OTP.
pub async fn upsert_potential_user(
    pool: &PgPool,
    email: &str,
    name: &str,
    password_hash: &str,
    salt: &str,
    otp: &str,
) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO potential_users (email, name, password_hash, salt, otp, otp_sent_at) \
         VALUES ($1, $2, $3, $4, $5, now()) \
         ON CONFLICT (email) DO UPDATE \
         SET name = $2, password_hash = $3, salt = $4, otp = $5, otp_sent_at = now()",
    )
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(salt)
    .bind(otp)
    .execute(pool)
    .await?;
    Ok(())
}

/// Issue a fresh OTP for an existing staged registration.
///
/// Returns `false` when no registration is pending for the email.
pub async fn refresh_potential_otp(
    pool: &PgPool,
    email: &str,
    otp: &str,
) -> Result<bool, AuthError> {
    let result = sqlx::query(
        "UPDATE potential_users SET otp = $2, otp_sent_at = now() WHERE email = $1",
    )
    .bind(email)
    .bind(otp)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Fetch a staged registration by email.
pub async fn find_potential_user(
    pool: &PgPool,
    email: &str,
) -> Result<Option<PotentialUser>, AuthError> {
    let row = sqlx::query_as::<_, (String, String, String, String, String, DateTime<Utc>)>(
        "SELECT email, name, password_hash, salt, otp, otp_sent_at \
         FROM potential_users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(
        |(email, name, password_hash, salt, otp, otp_sent_at)| PotentialUser {
            email,
            name,
            password_hash,
            salt,
            otp,
            otp_sent_at,
        },
    ))
}

/// Promote a verified registration to a full user and drop the staged row.
pub async fn promote_potential_user(
    pool: &PgPool,
    staged: &PotentialUser,
    free_quota: i64,
) -> Result<(), AuthError> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO users (email, name, password_hash, salt, quota) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&staged.email)
    .bind(&staged.name)
    .bind(&staged.password_hash)
    .bind(&staged.salt)
    .bind(free_quota)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM potential_users WHERE email = $1")
        .bind(&staged.email)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

/// Store a password-recovery OTP on the user.
///
/// Returns `false` when no such user exists.
pub async fn set_recovery_otp(
    pool: &PgPool,
    email: &str,
    otp: &str,
    expires_at: DateTime<Utc>,
) -> Result<bool, AuthError> {
    let result = sqlx::query(
        "UPDATE users SET recovery_otp = $2, recovery_otp_expires_at = $3 WHERE email = $1",
    )
    .bind(email)
    .bind(otp)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Apply a password reset in one statement: new credentials, cleared
/// recovery state, and the invalidation watermark.
pub async fn reset_password(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    salt: &str,
    watermark: DateTime<Utc>,
) -> Result<(), AuthError> {
    sqlx::query(
        "UPDATE users \
         SET password_hash = $2, salt = $3, token_invalidated_at = $4, \
             recovery_otp = NULL, recovery_otp_expires_at = NULL \
         WHERE email = $1",
    )
    .bind(email)
    .bind(password_hash)
    .bind(salt)
    .bind(watermark)
    .execute(pool)
    .await?;
    Ok(())
}

/// Set or replace the user's personal LLM API key.
pub async fn update_openai_key(
    pool: &PgPool,
    email: &str,
    openai_key: &str,
) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET openai_key = $2 WHERE email = $1")
        .bind(email)
        .bind(openai_key)
        .execute(pool)
        .await?;
    Ok(())
}

/// Atomically decrement the user's quota by `units`.
///
/// The floor is enforced in the statement itself: the update only applies
/// when the remaining quota covers the request, so concurrent submissions
/// cannot drive it negative. Returns `false` when the quota was insufficient
/// (and therefore unchanged).
pub async fn decrement_quota(pool: &PgPool, email: &str, units: i64) -> Result<bool, AuthError> {
    let result = sqlx::query(
        "UPDATE users SET quota = quota - $2 WHERE email = $1 AND quota >= $2",
    )
    .bind(email)
    .bind(units)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
