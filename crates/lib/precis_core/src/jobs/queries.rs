//! Job record database queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::JobError;
use crate::models::jobs::{Job, JobStatus};

type JobRow = (
    String,
    String,
    String,
    Option<String>,
    String,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

fn job_from_row(row: JobRow) -> Job {
    let (owner_email, task_id, input_text, summary, status, created_at, completed_at) = row;
    Job {
        owner_email,
        task_id,
        input_text,
        summary,
        // Unknown status text cannot appear: the column only ever receives
        // JobStatus::as_str values.
        status: JobStatus::parse(&status).unwrap_or(JobStatus::Failed),
        created_at,
        completed_at,
    }
}

const JOB_COLUMNS: &str =
    "owner_email, task_id, input_text, summary, status, created_at, completed_at";

/// Create a PENDING job record. The identifier must be assigned by the
/// dispatcher before the client learns of it.
pub async fn create_job(
    pool: &PgPool,
    owner_email: &str,
    task_id: &str,
    input_text: &str,
) -> Result<(), JobError> {
    sqlx::query(
        "INSERT INTO user_tasks (owner_email, task_id, input_text, status) \
         VALUES ($1, $2, $3, 'PENDING')",
    )
    .bind(owner_email)
    .bind(task_id)
    .bind(input_text)
    .execute(pool)
    .await?;
    Ok(())
}

/// Apply the terminal transition for a job, exactly once.
///
/// The status guard makes this atomic with respect to concurrent or
/// duplicate notifications: the second attempt matches zero rows and is
/// reported as `AlreadyFinalized` rather than double-applied.
pub async fn complete_job(
    pool: &PgPool,
    task_id: &str,
    status: JobStatus,
    summary: Option<&str>,
) -> Result<(), JobError> {
    debug_assert!(status.is_terminal());
    let result = sqlx::query(
        "UPDATE user_tasks \
         SET status = $2, summary = $3, completed_at = now() \
         WHERE task_id = $1 AND status = 'PENDING'",
    )
    .bind(task_id)
    .bind(status.as_str())
    .bind(summary)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(());
    }

    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM user_tasks WHERE task_id = $1)")
            .bind(task_id)
            .fetch_one(pool)
            .await?;
    if exists {
        Err(JobError::AlreadyFinalized)
    } else {
        Err(JobError::NotFound)
    }
}

/// Fetch a job, enforcing ownership.
pub async fn get_job(pool: &PgPool, task_id: &str, owner_email: &str) -> Result<Job, JobError> {
    let row = sqlx::query_as::<_, JobRow>(&format!(
        "SELECT {JOB_COLUMNS} FROM user_tasks WHERE task_id = $1"
    ))
    .bind(task_id)
    .fetch_optional(pool)
    .await?
    .ok_or(JobError::NotFound)?;

    let job = job_from_row(row);
    if job.owner_email != owner_email {
        return Err(JobError::Unauthorized);
    }
    Ok(job)
}

/// List a user's jobs, optionally filtered by status, newest first.
pub async fn list_jobs(
    pool: &PgPool,
    owner_email: &str,
    status: Option<JobStatus>,
) -> Result<Vec<Job>, JobError> {
    let rows = match status {
        Some(status) => {
            sqlx::query_as::<_, JobRow>(&format!(
                "SELECT {JOB_COLUMNS} FROM user_tasks \
                 WHERE owner_email = $1 AND status = $2 \
                 ORDER BY created_at DESC"
            ))
            .bind(owner_email)
            .bind(status.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, JobRow>(&format!(
                "SELECT {JOB_COLUMNS} FROM user_tasks \
                 WHERE owner_email = $1 \
                 ORDER BY created_at DESC"
            ))
            .bind(owner_email)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows.into_iter().map(job_from_row).collect())
}
