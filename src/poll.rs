//! Task-status polling.
//!
//! Processing a recording takes anywhere from seconds to several minutes, and
//! the backend offers no push channel. The poller asks for the task's status
//! immediately, then again every [`crate::ClientConfig::poll_interval_ms`]
//! until the task is `complete` or `failed`.
//!
//! ```text
//!   fetch ──▶ pending (0) ──sleep──▶ fetch ──▶ transcribing (3) ──sleep──▶ …
//!                                                         │
//!                        complete ──▶ Ok(TaskCompletion) ◀┘
//!                        failed   ──▶ Err(TaskFailed)
//!                        transport error ──▶ Err(PollingFailed)
//! ```
//!
//! Every outcome other than "still running" ends the chain for good. There is
//! no retry or backoff: a transient network error stops polling and the
//! caller starts a fresh chain (for example from a persisted session) when it
//! wants to continue.
//!
//! Cancellation is by drop: dropping the future returned by
//! [`TaskPoller::poll`] or the stream returned by [`TaskPoller::watch`]
//! clears the pending timer along with any in-flight request.

use crate::client::ApiClient;
use crate::error::{MinutesError, GENERIC_TASK_FAILURE};
use crate::models::{Task, TaskStatus};
use crate::progress::ProgressCallback;
use futures::stream;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

/// Anything that can report the current state of a task.
///
/// Implemented by [`ApiClient`]; tests drive the poller with scripted
/// sources.
pub trait TaskSource: Send + Sync {
    fn fetch_task(&self, task_id: &str) -> impl Future<Output = Result<Task, MinutesError>> + Send;
}

impl TaskSource for ApiClient {
    async fn fetch_task(&self, task_id: &str) -> Result<Task, MinutesError> {
        self.get_task(task_id).await
    }
}

/// One observation of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSnapshot {
    pub task_id: String,
    pub status: TaskStatus,
    /// Progress step for `status`; -1 for failed/unknown.
    pub step: i32,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Successful end of a poll chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub task_id: String,
    /// Number of status requests made, including the final one.
    pub ticks: usize,
    /// Step reported by each tick, in order.
    pub steps: Vec<i32>,
}

/// A boxed stream of poll snapshots, ending after the terminal item.
pub type StatusStream<'a> =
    Pin<Box<dyn Stream<Item = Result<PollSnapshot, MinutesError>> + Send + 'a>>;

/// Polls a task until it reaches a terminal status.
pub struct TaskPoller<S> {
    source: S,
    interval: Duration,
    progress: Option<ProgressCallback>,
}

impl<S: TaskSource> TaskPoller<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self {
            source,
            interval,
            progress: None,
        }
    }

    /// Report every tick to `callback`.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll until `complete`, returning the step history.
    ///
    /// # Errors
    /// - [`MinutesError::TaskFailed`] when the backend reports `failed`
    /// - [`MinutesError::PollingFailed`] when a request does not succeed
    pub async fn poll(&self, task_id: &str) -> Result<TaskCompletion, MinutesError> {
        info!("Polling task {} every {:?}", task_id, self.interval);
        if let Some(ref cb) = self.progress {
            cb.on_poll_start(task_id);
        }

        let mut steps = Vec::new();
        loop {
            if !steps.is_empty() {
                sleep(self.interval).await;
            }
            let snapshot = self.advance(task_id).await?;
            steps.push(snapshot.step);

            if snapshot.status == TaskStatus::Complete {
                return Ok(TaskCompletion {
                    task_id: task_id.to_string(),
                    ticks: steps.len(),
                    steps,
                });
            }
        }
    }

    /// The same loop as [`TaskPoller::poll`], one item per tick.
    ///
    /// The stream yields `Ok` for every non-failed status, including the
    /// final `complete`, and ends after it. A failed task or a transport
    /// error is yielded as a single `Err` and also ends the stream.
    pub fn watch<'a>(&'a self, task_id: &'a str) -> StatusStream<'a> {
        #[derive(Clone, Copy)]
        enum State {
            First,
            Waiting,
            Done,
        }

        let s = stream::unfold(State::First, move |state| async move {
            match state {
                State::Done => None,
                State::First | State::Waiting => {
                    if matches!(state, State::First) {
                        if let Some(ref cb) = self.progress {
                            cb.on_poll_start(task_id);
                        }
                    } else {
                        sleep(self.interval).await;
                    }
                    let item = self.advance(task_id).await;
                    let next = match &item {
                        Ok(snapshot) if !snapshot.status.is_terminal() => State::Waiting,
                        _ => State::Done,
                    };
                    Some((item, next))
                }
            }
        });

        Box::pin(s)
    }

    /// Make a single status request without sleeping or interpreting the
    /// result beyond the step lookup.
    pub async fn tick(&self, task_id: &str) -> Result<PollSnapshot, MinutesError> {
        let task = self
            .source
            .fetch_task(task_id)
            .await
            .map_err(|e| MinutesError::PollingFailed {
                task_id: task_id.to_string(),
                reason: e.to_string(),
            })?;

        let step = task.status.step();
        debug!("Task {}: status={} step={}", task_id, task.status, step);
        if let Some(ref cb) = self.progress {
            cb.on_status(task_id, &task.status, step);
        }

        Ok(PollSnapshot {
            task_id: task_id.to_string(),
            status: task.status,
            step,
            error_message: task.error_message,
        })
    }

    /// One tick, with terminal statuses turned into completion or error.
    async fn advance(&self, task_id: &str) -> Result<PollSnapshot, MinutesError> {
        let snapshot = match self.tick(task_id).await {
            Ok(s) => s,
            Err(e) => {
                warn!("Polling task {} stopped: {}", task_id, e);
                if let Some(ref cb) = self.progress {
                    cb.on_error(task_id, &e.to_string());
                }
                return Err(e);
            }
        };

        match snapshot.status {
            TaskStatus::Complete => {
                info!("Task {} complete", task_id);
                if let Some(ref cb) = self.progress {
                    cb.on_complete(task_id);
                }
                Ok(snapshot)
            }
            TaskStatus::Failed => {
                let message = snapshot
                    .error_message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_TASK_FAILURE.to_string());
                warn!("Task {} failed: {}", task_id, message);
                if let Some(ref cb) = self.progress {
                    cb.on_error(task_id, &message);
                }
                Err(MinutesError::TaskFailed {
                    task_id: task_id.to_string(),
                    message,
                })
            }
            _ => Ok(snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::PollProgressCallback;
    use futures::StreamExt;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays a fixed sequence of responses, one per request.
    struct Scripted {
        replies: Mutex<VecDeque<Result<Task, MinutesError>>>,
        calls: Mutex<usize>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<Task, MinutesError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(0),
            }
        }

        fn statuses(statuses: &[&str]) -> Self {
            Self::new(statuses.iter().map(|s| Ok(task(s, None))).collect())
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl TaskSource for Scripted {
        async fn fetch_task(&self, _task_id: &str) -> Result<Task, MinutesError> {
            *self.calls.lock().unwrap() += 1;
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(MinutesError::Internal("script exhausted".into())))
        }
    }

    fn task(status: &str, error_message: Option<&str>) -> Task {
        Task {
            id: Some("t-1".into()),
            status: TaskStatus::from(status),
            error_message: error_message.map(str::to_string),
        }
    }

    fn poller(source: Scripted) -> TaskPoller<Scripted> {
        TaskPoller::new(source, Duration::from_millis(1))
    }

    #[derive(Default)]
    struct Recorder {
        steps: Mutex<Vec<i32>>,
        completed: Mutex<bool>,
        errors: Mutex<Vec<String>>,
    }

    impl PollProgressCallback for Recorder {
        fn on_status(&self, _task_id: &str, _status: &TaskStatus, step: i32) {
            self.steps.lock().unwrap().push(step);
        }
        fn on_complete(&self, _task_id: &str) {
            *self.completed.lock().unwrap() = true;
        }
        fn on_error(&self, _task_id: &str, error: &str) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    #[tokio::test]
    async fn pending_processing_complete() {
        let recorder = Arc::new(Recorder::default());
        let p = poller(Scripted::statuses(&["pending", "processing", "complete"]))
            .with_progress(recorder.clone());

        let done = p.poll("t-1").await.unwrap();
        assert_eq!(done.ticks, 3);
        assert_eq!(done.steps[..2], [0, 1]);
        assert_eq!(p.source.calls(), 3, "no request after complete");
        assert!(*recorder.completed.lock().unwrap());
        assert!(recorder.errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn pending_failed_surfaces_server_message() {
        let source = Scripted::new(vec![
            Ok(task("pending", None)),
            Ok(task("failed", Some("speech recognition quota exceeded"))),
        ]);
        let p = poller(source);

        let err = p.poll("t-1").await.unwrap_err();
        match err {
            MinutesError::TaskFailed { message, .. } => {
                assert_eq!(message, "speech recognition quota exceeded")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(p.source.calls(), 2);
    }

    #[tokio::test]
    async fn failed_without_message_uses_generic_text() {
        let p = poller(Scripted::new(vec![Ok(task("failed", Some("  ")))]));
        let err = p.poll("t-1").await.unwrap_err();
        assert!(err.to_string().contains(GENERIC_TASK_FAILURE), "got: {err}");
    }

    #[tokio::test]
    async fn transport_error_stops_without_retry() {
        let source = Scripted::new(vec![
            Ok(task("pending", None)),
            Err(MinutesError::Server {
                status: 502,
                body: "bad gateway".into(),
            }),
            Ok(task("complete", None)),
        ]);
        let recorder = Arc::new(Recorder::default());
        let p = poller(source).with_progress(recorder.clone());

        let err = p.poll("t-1").await.unwrap_err();
        assert!(matches!(err, MinutesError::PollingFailed { .. }));
        assert_eq!(p.source.calls(), 2, "no retry after a transport failure");
        assert_eq!(recorder.errors.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_status_keeps_polling_with_step_minus_one() {
        let p = poller(Scripted::statuses(&["queued", "generating", "complete"]));
        let done = p.poll("t-1").await.unwrap();
        assert_eq!(done.steps, vec![-1, 4, -1]);
    }

    #[tokio::test]
    async fn waits_interval_between_ticks_only() {
        let p = TaskPoller::new(
            Scripted::statuses(&["pending", "complete"]),
            Duration::from_millis(40),
        );
        let start = std::time::Instant::now();
        p.poll("t-1").await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(40), "slept {elapsed:?}");
        assert!(elapsed < Duration::from_millis(2000), "slept {elapsed:?}");
    }

    #[tokio::test]
    async fn watch_yields_each_tick_and_ends() {
        let p = poller(Scripted::statuses(&[
            "pending",
            "converting",
            "transcribing",
            "complete",
        ]));
        let items: Vec<_> = p.watch("t-1").collect().await;
        let steps: Vec<i32> = items.iter().map(|r| r.as_ref().unwrap().step).collect();
        assert_eq!(steps, vec![0, 2, 3, -1]);
        assert_eq!(p.source.calls(), 4);
    }

    #[tokio::test]
    async fn watch_ends_with_single_error_on_failure() {
        let p = poller(Scripted::new(vec![
            Ok(task("processing", None)),
            Ok(task("failed", None)),
        ]));
        let items: Vec<_> = p.watch("t-1").collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(MinutesError::TaskFailed { .. })));
    }

    #[tokio::test]
    async fn tick_does_not_interpret_failed() {
        let p = poller(Scripted::new(vec![Ok(task("failed", Some("x")))]));
        let snap = p.tick("t-1").await.unwrap();
        assert_eq!(snap.status, TaskStatus::Failed);
        assert_eq!(snap.step, -1);
    }
}
