//! Summarisation submission and polling handlers.

use axum::extract::{Multipart, Query, State};
use axum::{Extension, Json};

use precis_core::models::jobs::JobStatus;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentUser;
use crate::models::{
    CompletedTasksResponse, GetSummaryParams, PendingTasksResponse, SubmitResponse,
    SummaryResponse, TasksResponse,
};
use crate::services::summaries;

/// `POST /generate_summary`: multipart upload, returns the enqueued task id.
pub async fn generate_summary_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> AppResult<Json<SubmitResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .ok_or_else(|| AppError::BadRequest("File field has no filename".into()))?
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file field: {e}")))?;

        let resp = summaries::submit(
            &state.pool,
            &state.dispatcher,
            &state.config,
            &user,
            &filename,
            &bytes,
        )
        .await?;
        return Ok(Json(resp));
    }

    Err(AppError::BadRequest(
        "Missing 'file' field in multipart form".to_string(),
    ))
}

/// `GET /user/get_summary?task_id=...`: poll one task's status and result.
pub async fn get_summary_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<GetSummaryParams>,
) -> AppResult<Json<SummaryResponse>> {
    let resp = summaries::get_summary(&state.pool, &user, &params.task_id).await?;
    Ok(Json(resp))
}

/// `GET /user/pending_tasks`
pub async fn pending_tasks_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<PendingTasksResponse>> {
    let tasks = summaries::list_tasks(&state.pool, &user, Some(JobStatus::Pending)).await?;
    Ok(Json(PendingTasksResponse {
        pending_tasks: tasks,
    }))
}

/// `GET /user/completed_tasks`: terminal-success tasks only.
pub async fn completed_tasks_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<CompletedTasksResponse>> {
    let tasks = summaries::list_tasks(&state.pool, &user, Some(JobStatus::Success)).await?;
    Ok(Json(CompletedTasksResponse {
        completed_tasks: tasks,
    }))
}

/// `GET /user/tasks`: every task regardless of status.
pub async fn all_tasks_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<TasksResponse>> {
    let tasks = summaries::list_tasks(&state.pool, &user, None).await?;
    Ok(Json(TasksResponse { tasks }))
}
