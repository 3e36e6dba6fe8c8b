//! Summarisation submission pipeline and polling reads.

use sqlx::PgPool;
use tracing::info;

use precis_core::config::AppConfig;
use precis_core::dispatch::{Dispatcher, JobRequest, new_task_id};
use precis_core::jobs;
use precis_core::models::auth::User;
use precis_core::models::jobs::JobStatus;
use precis_core::parse::{extract_text, file_extension};

use crate::error::{AppError, AppResult};
use crate::models::{SubmitResponse, SummaryResponse, TaskView};

/// Submit an uploaded document for summarisation.
///
/// Pipeline: extract text, settle the credential (personal key, or server
/// key paid for from the free-trial quota), create the PENDING job record,
/// then enqueue. The record exists before the client ever learns the id.
pub async fn submit(
    pool: &PgPool,
    dispatcher: &Dispatcher,
    config: &AppConfig,
    user: &User,
    filename: &str,
    bytes: &[u8],
) -> AppResult<SubmitResponse> {
    let extension = file_extension(filename)
        .ok_or_else(|| AppError::BadRequest("Filename has no extension".into()))?;
    let text = extract_text(bytes, extension)?;
    let units = text.chars().count() as i64;

    // Quota is charged post-extraction, in characters, and only when the
    // caller has no personal credential. The decrement is atomic with its
    // floor check; on rejection the quota is untouched.
    let credential = match &user.openai_key {
        Some(key) => key.clone(),
        None => {
            if !precis_core::auth::queries::decrement_quota(pool, &user.email, units).await? {
                return Err(AppError::PaymentRequired(
                    "Free-trial quota exhausted".into(),
                ));
            }
            config.openai_api_key.clone()
        }
    };

    let task_id = new_task_id();
    jobs::create_job(pool, &user.email, &task_id, &text).await?;
    dispatcher.submit(JobRequest {
        task_id: task_id.clone(),
        credential,
        text,
    })?;

    info!(email = %user.email, task_id, units, "summary task enqueued");
    Ok(SubmitResponse {
        message: "Your summary task has been enqueued".to_string(),
        task_id,
    })
}

/// Fetch one job's status and result, enforcing ownership.
pub async fn get_summary(
    pool: &PgPool,
    user: &User,
    task_id: &str,
) -> AppResult<SummaryResponse> {
    let job = jobs::get_job(pool, task_id, &user.email).await?;
    let message = match job.status {
        JobStatus::Pending => "Task is still pending",
        JobStatus::Success => "Task completed successfully",
        JobStatus::Failed => "Task failed",
    };
    Ok(SummaryResponse {
        message: message.to_string(),
        status: job.status,
        result: job.summary,
    })
}

/// List the caller's jobs, optionally filtered by status.
pub async fn list_tasks(
    pool: &PgPool,
    user: &User,
    status: Option<JobStatus>,
) -> AppResult<Vec<TaskView>> {
    let jobs = jobs::list_jobs(pool, &user.email, status).await?;
    Ok(jobs.into_iter().map(TaskView::from).collect())
}
