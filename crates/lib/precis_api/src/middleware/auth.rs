//! Authentication middleware: Bearer token extraction and identity
//! resolution (signature, expiry, and invalidation watermark).

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use precis_core::auth::jwt::resolve_identity;
use precis_core::models::auth::User;

use crate::AppState;
use crate::error::AppError;

/// The resolved caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Axum middleware: extracts `Authorization: Bearer <token>`, resolves the
/// caller through the token service, and injects [`CurrentUser`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))?;

    let user = resolve_identity(&state.pool, token, state.config.jwt_secret.as_bytes()).await?;

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
