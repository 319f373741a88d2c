//! Error types for the meeting-minutes client.
//!
//! Every failure in this crate is terminal for the operation that raised it:
//! nothing is retried, and the caller decides what to show the user. The
//! variants fall into a handful of families so callers can still tell them
//! apart:
//!
//! * **Input**: the local recording cannot be uploaded at all.
//! * **Transport**: the request never produced a usable response
//!   (connection error, non-2xx status, body that does not decode).
//! * **Backend-reported**: the backend answered, and the answer is a failure
//!   (a task that ended in `failed`, minutes that do not exist yet).
//! * **Download**: fetching the rendered minutes file failed.
//! * **Session / I/O**: the persisted workspace snapshot or an output file
//!   could not be read or written.

use std::path::PathBuf;
use thiserror::Error;

/// Message surfaced when a task fails without a server-provided reason.
pub const GENERIC_TASK_FAILURE: &str = "Task failed";

/// Message surfaced when polling stops on a transport failure.
pub const GENERIC_POLLING_FAILURE: &str = "Polling error";

/// All errors returned by the meeting-minutes library.
#[derive(Debug, Error)]
pub enum MinutesError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Recording was not found at the given path.
    #[error("Recording not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the recording.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The recording's extension is not one the backend accepts.
    #[error("Unsupported recording format: '{path}'\nAccepted formats: .mp3, .wav, .m4a")]
    UnsupportedMedia { path: PathBuf },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The upload request failed or was rejected.
    #[error("Failed to upload '{path}': {reason}")]
    UploadFailed { path: PathBuf, reason: String },

    /// Saving the meeting title/participants failed.
    #[error("Failed to update meeting {meeting_id}: {reason}")]
    MeetingUpdateFailed { meeting_id: String, reason: String },

    /// The backend refused to create a processing task.
    #[error("Failed to create task for meeting {meeting_id}: {reason}")]
    TaskCreationFailed { meeting_id: String, reason: String },

    /// A poll tick could not reach the task endpoint or decode its answer.
    ///
    /// Polling is not resumed after this; start a fresh chain to continue.
    #[error("{GENERIC_POLLING_FAILURE} for task {task_id}: {reason}")]
    PollingFailed { task_id: String, reason: String },

    /// Fetching a document (transcript, meeting info, minutes) failed.
    #[error("Failed to fetch {what}: {reason}")]
    FetchFailed { what: &'static str, reason: String },

    /// The backend answered with a non-success status.
    #[error("Server returned HTTP {status}: {body}")]
    Server { status: u16, body: String },

    /// Request could not be built or sent.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // ── Backend-reported failures ─────────────────────────────────────────
    /// The task reached the `failed` status.
    #[error("Task {task_id} failed: {message}")]
    TaskFailed { task_id: String, message: String },

    /// Minutes have not been generated yet (or the backend lost them).
    #[error("Minutes for meeting {meeting_id} are not ready yet")]
    MinutesNotReady { meeting_id: String },

    /// An operation needs a meeting but the session has none.
    #[error("No meeting in the current session.\nUpload a recording first: minutes upload <file>")]
    NoMeeting,

    // ── Download errors ───────────────────────────────────────────────────
    /// Downloading the rendered minutes failed.
    #[error("Failed to download minutes for meeting {meeting_id}: {reason}")]
    DownloadFailed { meeting_id: String, reason: String },

    // ── Session / I/O errors ──────────────────────────────────────────────
    /// The session file exists but is not a valid snapshot.
    #[error("Session file '{path}' is corrupt: {detail}\nRemove it or run: minutes session clear")]
    SessionCorrupt { path: PathBuf, detail: String },

    /// Could not create or write an output file.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MinutesError {
    /// True when the backend itself reported the failure, as opposed to the
    /// request never getting a usable answer.
    pub fn is_backend_reported(&self) -> bool {
        matches!(
            self,
            MinutesError::TaskFailed { .. }
                | MinutesError::MinutesNotReady { .. }
                | MinutesError::Server { .. }
        )
    }
}
