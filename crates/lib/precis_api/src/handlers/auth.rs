//! Authentication request handlers.

use axum::extract::State;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::models::{
    EmailRequest, LoginRequest, OtpSentResponse, RefreshResponse, RegisterRequest,
    ResetPasswordRequest, TokenResponse, VerifyRequest,
};
use crate::services::auth;

/// `POST /user/register/password`: stage a registration and send an OTP.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<OtpSentResponse>> {
    let resp = auth::register(
        &state.pool,
        state.mailer.as_ref(),
        &state.config,
        &body.user_email,
        &body.user_name,
        &body.user_password,
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /user/register/resend_otp`: re-issue the OTP for a pending
/// registration.
pub async fn resend_otp_handler(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> AppResult<Json<OtpSentResponse>> {
    let resp = auth::resend_otp(
        &state.pool,
        state.mailer.as_ref(),
        &state.config,
        &body.user_email,
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /user/register/verify`: verify the OTP and create the account.
pub async fn verify_handler(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::verify(&state.pool, &state.config, &body.user_email, &body.otp).await?;
    Ok(Json(resp))
}

/// `POST /user/login/password`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::login(
        &state.pool,
        &state.config,
        &body.user_email,
        &body.user_password,
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /user/auth/refresh_token`: re-issue a token for the caller.
/// Requires authentication.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<RefreshResponse>> {
    let resp = auth::refresh(&state.config, &user)?;
    Ok(Json(resp))
}

/// `POST /user/auth/forgot_password`: begin password recovery.
pub async fn forgot_password_handler(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> AppResult<Json<OtpSentResponse>> {
    let resp = auth::forgot_password(
        &state.pool,
        state.mailer.as_ref(),
        &state.config,
        &body.user_email,
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /user/auth/reset_password`: complete password recovery; revokes
/// all previously issued tokens.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::reset_password(
        &state.pool,
        &state.config,
        &body.user_email,
        &body.user_otp,
        &body.user_new_password,
    )
    .await?;
    Ok(Json(resp))
}
