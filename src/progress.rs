//! Progress-callback trait for task polling events.
//!
//! Inject an [`Arc<dyn PollProgressCallback>`] into
//! [`crate::poll::TaskPoller::with_progress`] to receive an event on every
//! poll tick. The CLI uses it to drive a progress bar; a library caller can
//! forward events to a channel, a log, or its own UI state.
//!
//! # Example
//!
//! ```rust
//! use meeting_minutes::{PollProgressCallback, TaskStatus};
//! use std::sync::atomic::{AtomicI32, Ordering};
//!
//! struct LastStep(AtomicI32);
//!
//! impl PollProgressCallback for LastStep {
//!     fn on_status(&self, _task_id: &str, _status: &TaskStatus, step: i32) {
//!         self.0.store(step, Ordering::SeqCst);
//!     }
//! }
//!
//! let cb = LastStep(AtomicI32::new(-1));
//! cb.on_status("t-1", &TaskStatus::Transcribing, 3);
//! assert_eq!(cb.0.load(Ordering::SeqCst), 3);
//! ```

use crate::models::TaskStatus;
use std::sync::Arc;

/// Called by the poller as a task moves through its statuses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait PollProgressCallback: Send + Sync {
    /// Called once before the first request.
    fn on_poll_start(&self, task_id: &str) {
        let _ = task_id;
    }

    /// Called after every successful status request.
    ///
    /// # Arguments
    /// * `status`: status reported by the backend
    /// * `step`: progress step derived from it (-1 for failed/unknown)
    fn on_status(&self, task_id: &str, status: &TaskStatus, step: i32) {
        let _ = (task_id, status, step);
    }

    /// Called once when the task reaches `complete`.
    fn on_complete(&self, task_id: &str) {
        let _ = task_id;
    }

    /// Called once when polling ends in an error, either because the task
    /// failed or because a request did not succeed.
    fn on_error(&self, task_id: &str, error: &str) {
        let _ = (task_id, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PollProgressCallback for NoopProgressCallback {}

/// Convenience alias for the type stored by the poller.
pub type ProgressCallback = Arc<dyn PollProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        steps: Mutex<Vec<i32>>,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl PollProgressCallback for TrackingCallback {
        fn on_status(&self, _task_id: &str, _status: &TaskStatus, step: i32) {
            self.steps.lock().unwrap().push(step);
        }

        fn on_complete(&self, _task_id: &str) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, _task_id: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_poll_start("t");
        cb.on_status("t", &TaskStatus::Pending, 0);
        cb.on_complete("t");
        cb.on_error("t", "boom");
    }

    #[test]
    fn arc_dyn_callback_records_events() {
        let tracker = Arc::new(TrackingCallback::default());
        let cb: ProgressCallback = tracker.clone();

        cb.on_status("t", &TaskStatus::Pending, 0);
        cb.on_status("t", &TaskStatus::Processing, 1);
        cb.on_complete("t");

        assert_eq!(*tracker.steps.lock().unwrap(), vec![0, 1]);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 0);
    }
}
