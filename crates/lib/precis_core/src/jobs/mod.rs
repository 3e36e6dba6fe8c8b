//! Job record store.
//!
//! The single mutable resource shared between the request path and the
//! worker notification path. `complete_job` is the only way out of PENDING
//! and is check-and-set at the SQL level.

pub mod queries;

use thiserror::Error;

pub use queries::{complete_job, create_job, get_job, list_jobs};

/// Job store errors.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Task not found")]
    NotFound,

    /// The caller does not own the job.
    #[error("Not authorized for this task")]
    Unauthorized,

    /// The job is already in a terminal state; the attempted transition was
    /// not applied.
    #[error("Task already finalized")]
    AlreadyFinalized,

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}
