//! Sanity-check endpoint.

use axum::Json;

use crate::models::MessageResponse;

/// `GET /`: liveness probe.
pub async fn sanity_check() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Service is up!".to_string(),
    })
}
