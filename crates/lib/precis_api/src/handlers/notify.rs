//! Worker notification callback.
//!
//! Internal endpoint authenticated by the shared notification key, not user
//! JWTs: the worker pool runs in its own trust domain and reports outcomes
//! here instead of touching the store directly.

use axum::Json;
use axum::extract::State;
use tracing::{info, warn};

use precis_core::dispatch::NotifyPayload;
use precis_core::jobs::{self, JobError};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::MessageResponse;

/// `POST /notify/task`: apply a job's terminal transition.
///
/// Delivery from the queue is at-least-once, so a duplicate notification for
/// an already-finalized job is a 200 no-op rather than an error.
pub async fn notify_task_handler(
    State(state): State<AppState>,
    Json(body): Json<NotifyPayload>,
) -> AppResult<Json<MessageResponse>> {
    if body.notification_auth != state.config.notify_key {
        return Err(AppError::Unauthorized("Invalid notification key".into()));
    }
    if !body.task_status.is_terminal() {
        return Err(AppError::BadRequest(
            "Notification status must be terminal".into(),
        ));
    }

    match jobs::complete_job(
        &state.pool,
        &body.task_id,
        body.task_status,
        body.generated_summary.as_deref(),
    )
    .await
    {
        Ok(()) => {
            info!(task_id = %body.task_id, status = body.task_status.as_str(), "task finalized");
            Ok(Json(MessageResponse {
                message: "Task updated".to_string(),
            }))
        }
        Err(JobError::AlreadyFinalized) => {
            warn!(task_id = %body.task_id, "duplicate notification ignored");
            Ok(Json(MessageResponse {
                message: "Task already finalized".to_string(),
            }))
        }
        Err(e) => Err(e.into()),
    }
}
