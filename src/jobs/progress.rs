//! Live progress events for a job, produced by polling the registry.
//!
//! The stream is lazy and self-terminating: it re-reads the registry at a
//! fixed interval, emits the latest snapshot each tick (periodic re-emission
//! of an unchanged state is fine), and closes after exactly one terminal
//! event. An unknown job id yields a single synthetic not-found event.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::task::JoinHandle;

use super::registry::{JobId, JobRegistry, JobSnapshot};

/// One event on a job progress stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// The job's latest snapshot at poll time.
    Status(JobSnapshot),
    /// The registry has no such job; emitted once, then the stream closes.
    NotFound { job_id: JobId },
}

impl ProgressEvent {
    /// Whether this event is the last one the stream will emit.
    pub fn is_terminal(&self) -> bool {
        match self {
            ProgressEvent::Status(snapshot) => snapshot.is_terminal(),
            ProgressEvent::NotFound { .. } => true,
        }
    }

    /// Convert to the wire payload served to status watchers.
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            ProgressEvent::Status(snapshot) => {
                let mut payload = json!({
                    "job_id": snapshot.id,
                    "progress": snapshot.progress,
                    "message": snapshot.message,
                    "completed": snapshot.completed,
                });
                if let Some(error) = &snapshot.error {
                    payload["error"] = json!(error);
                }
                payload
            }
            ProgressEvent::NotFound { job_id } => json!({
                "job_id": job_id,
                "progress": 0,
                "error": "Task not found",
            }),
        }
    }

    /// Frame the event for a server-sent-events response.
    pub fn to_sse_frame(&self) -> String {
        format!("data: {}\n\n", self.to_json_value())
    }
}

/// Handle to a spawned poller plus the receiving end of its event channel.
///
/// Dropping the stream stops the poller at its next tick (the send fails and
/// the task exits); consuming the stream to its end always observes the
/// terminal event first.
#[derive(Debug)]
pub struct ProgressStream {
    receiver: flume::Receiver<ProgressEvent>,
    _poller: JoinHandle<()>,
}

impl ProgressStream {
    /// Start polling `registry` for `job_id` every `poll_interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(
        registry: Arc<JobRegistry>,
        job_id: JobId,
        poll_interval: Duration,
    ) -> Self {
        let (tx, rx) = flume::unbounded();
        let poller = tokio::spawn(async move {
            loop {
                let event = match registry.get(job_id) {
                    Some(snapshot) => ProgressEvent::Status(snapshot),
                    None => ProgressEvent::NotFound { job_id },
                };
                let terminal = event.is_terminal();
                if tx.send(event).is_err() {
                    // Subscriber hung up.
                    break;
                }
                if terminal {
                    break;
                }
                tokio::time::sleep(poll_interval).await;
            }
        });
        Self {
            receiver: rx,
            _poller: poller,
        }
    }

    /// Next event, or `None` once the stream has closed after its terminal
    /// event.
    pub async fn recv(&self) -> Option<ProgressEvent> {
        self.receiver.recv_async().await.ok()
    }

    /// Adapt into a `futures_util`-compatible stream, e.g. for an SSE body.
    pub fn into_async_stream(self) -> impl futures_util::Stream<Item = ProgressEvent> {
        self.receiver.into_stream()
    }
}
