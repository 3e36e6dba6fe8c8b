//! User settings handlers.

use axum::extract::State;
use axum::{Extension, Json};

use precis_core::auth::queries;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::models::{MessageResponse, UpdateKeyRequest};

/// `POST /user/update_key`: set the caller's personal LLM API key.
/// Submissions with a personal key bypass quota accounting.
pub async fn update_key_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<UpdateKeyRequest>,
) -> AppResult<Json<MessageResponse>> {
    queries::update_openai_key(&state.pool, &user.email, &body.openai_api_key).await?;
    Ok(Json(MessageResponse {
        message: "OpenAI key updated successfully".to_string(),
    }))
}
