//! Task dispatcher and summarisation worker pool.
//!
//! The dispatcher owns the boundary between the request path and the worker
//! pool: `submit` enqueues and returns as soon as the job is queued, and
//! workers report outcomes through the [`Notifier`] callback (shared-secret
//! authenticated), never by writing to the store themselves.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::models::jobs::JobStatus;
use crate::summarise::{LlmClient, summarise_doc};

/// Dispatch errors.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The worker pool is gone; no new work can be accepted.
    #[error("Work queue is closed")]
    QueueClosed,

    #[error("Notification failed: {0}")]
    Notify(String),
}

/// One unit of queued summarisation work.
#[derive(Debug)]
pub struct JobRequest {
    pub task_id: String,
    /// API key chosen at submission time.
    pub credential: String,
    pub text: String,
}

/// Outcome reported by a worker, exactly once per job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub task_id: String,
    pub status: JobStatus,
    pub summary: Option<String>,
}

/// Wire format of the notification callback.
#[derive(Debug, Serialize, Deserialize)]
pub struct NotifyPayload {
    pub notification_auth: String,
    pub task_id: String,
    pub task_status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_summary: Option<String>,
}

/// Assign an opaque job identifier.
pub fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Handle used by the request path to enqueue work.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<JobRequest>,
}

impl Dispatcher {
    /// Enqueue a job. Returns once the job is queued; never waits for the
    /// LLM.
    pub fn submit(&self, request: JobRequest) -> Result<(), DispatchError> {
        self.tx.send(request).map_err(|_| DispatchError::QueueClosed)
    }
}

/// Create the work queue: a dispatcher handle and the receiver the worker
/// pool consumes.
pub fn queue() -> (Dispatcher, mpsc::UnboundedReceiver<JobRequest>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Dispatcher { tx }, rx)
}

/// Outcome delivery seam. The HTTP implementation crosses the trust boundary
/// back into the API process; tests substitute a recorder.
pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        outcome: &JobOutcome,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

/// Posts outcomes to the `/notify/task` endpoint with the shared key.
#[derive(Clone)]
pub struct HttpNotifier {
    http: reqwest::Client,
    url: String,
    key: String,
}

impl HttpNotifier {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            key: key.into(),
        }
    }
}

impl Notifier for HttpNotifier {
    async fn notify(&self, outcome: &JobOutcome) -> Result<(), DispatchError> {
        let payload = NotifyPayload {
            notification_auth: self.key.clone(),
            task_id: outcome.task_id.clone(),
            task_status: outcome.status,
            generated_summary: outcome.summary.clone(),
        };
        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DispatchError::Notify(format!("callback request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(DispatchError::Notify(format!(
                "callback rejected: {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Spawn `count` long-lived worker tasks consuming the shared queue.
///
/// A worker converts every job into exactly one outcome notification. LLM
/// failures become FAILED outcomes. Notification failures are logged, not
/// propagated, so the pool outlives any single bad job.
pub fn spawn_workers<C, N>(
    count: usize,
    rx: mpsc::UnboundedReceiver<JobRequest>,
    llm: Arc<C>,
    notifier: Arc<N>,
    page_size: usize,
) -> Vec<JoinHandle<()>>
where
    C: LlmClient + 'static,
    N: Notifier + 'static,
{
    let rx = Arc::new(Mutex::new(rx));
    (0..count)
        .map(|worker| {
            let rx = Arc::clone(&rx);
            let llm = Arc::clone(&llm);
            let notifier = Arc::clone(&notifier);
            tokio::spawn(async move {
                loop {
                    let request = { rx.lock().await.recv().await };
                    let Some(request) = request else {
                        info!(worker, "work queue closed, worker exiting");
                        break;
                    };
                    let outcome = process(&*llm, request, page_size).await;
                    if let Err(e) = notifier.notify(&outcome).await {
                        error!(worker, task_id = %outcome.task_id, error = %e,
                            "failed to deliver outcome notification");
                    }
                }
            })
        })
        .collect()
}

/// Run one job to its outcome.
async fn process<C: LlmClient>(llm: &C, request: JobRequest, page_size: usize) -> JobOutcome {
    match summarise_doc(llm, &request.credential, &request.text, page_size).await {
        Ok(summary) => JobOutcome {
            task_id: request.task_id,
            status: JobStatus::Success,
            summary: Some(summary),
        },
        Err(e) => {
            warn!(task_id = %request.task_id, error = %e, "summarisation failed");
            JobOutcome {
                task_id: request.task_id,
                status: JobStatus::Failed,
                summary: None,
            }
        }
    }
}
