//! Request and response bodies for the HTTP API.

use chrono::{DateTime, Utc};
use precis_core::models::jobs::{Job, JobStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub user_name: String,
    pub user_email: String,
    pub user_password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub user_email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub user_email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_email: String,
    pub user_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub user_email: String,
    pub user_otp: String,
    pub user_new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateKeyRequest {
    pub openai_api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct GetSummaryParams {
    pub task_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OtpSentResponse {
    pub message: String,
    /// OTP validity window in seconds.
    pub expiry_in: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub message: String,
    pub jwt_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub message: String,
    pub task_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub message: String,
    pub status: JobStatus,
    pub result: Option<String>,
}

/// Job record as exposed in listings (input text omitted).
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskView {
    pub task_id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Job> for TaskView {
    fn from(job: Job) -> Self {
        Self {
            task_id: job.task_id,
            status: job.status,
            created_at: job.created_at,
            completed_at: job.completed_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingTasksResponse {
    pub pending_tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletedTasksResponse {
    pub completed_tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
