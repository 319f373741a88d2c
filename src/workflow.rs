//! End-to-end operations on a meeting.
//!
//! These functions chain the [`ApiClient`] calls a user actually performs:
//! upload a recording and wait for its minutes, pick a half-finished run back
//! up, show a document, save the minutes to disk. Whenever a
//! [`PersistentSession`] is supplied it is updated and written after every
//! step, so a run interrupted at any point leaves an accurate snapshot
//! behind.

use crate::client::ApiClient;
use crate::document::clean::clean_minutes;
use crate::document::info::meeting_info_table;
use crate::document::paginate::{Page, Paginator};
use crate::error::{MinutesError, GENERIC_POLLING_FAILURE};
use crate::io::write_atomic;
use crate::models::{DownloadFormat, Meeting, MeetingDetails, Minutes, TaskStatus};
use crate::poll::{TaskCompletion, TaskPoller};
use crate::progress::ProgressCallback;
use crate::session::{DocumentKind, PersistentSession, Session};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A recording that was uploaded and queued for processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub meeting: Meeting,
    pub task_id: String,
}

/// How a processing run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ProcessingOutcome {
    /// The task reached `complete`.
    Completed(TaskCompletion),
    /// The task was queued and not waited for.
    Queued,
}

/// Result of [`process_recording`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingOutput {
    pub meeting: Meeting,
    pub task_id: String,
    pub outcome: ProcessingOutcome,
}

/// Generated minutes, cleaned and split into print pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinutesDocument {
    pub minutes: Minutes,
    /// `md_text` with the outer code fence removed.
    pub markdown: String,
    pub pages: Vec<Page>,
}

/// Apply `change` to the session, if there is one, and write it.
fn persist<F>(session: &mut Option<&mut PersistentSession>, change: F) -> Result<(), MinutesError>
where
    F: FnOnce(&mut Session),
{
    match session {
        Some(s) => s.update(change),
        None => Ok(()),
    }
}

/// Record `err` as the session's visible error and hand it back.
fn record_failure(
    session: &mut Option<&mut PersistentSession>,
    err: MinutesError,
) -> MinutesError {
    let message = err.to_string();
    if let Err(save_err) = persist(session, |s| s.fail(message)) {
        warn!("Could not record failure in session: {}", save_err);
    }
    err
}

/// Upload `path`, attach `details`, and create the processing task.
///
/// The session is reset for the new recording before the upload starts. An
/// empty `details` skips the `PATCH` request.
pub async fn submit_recording(
    client: &ApiClient,
    path: impl AsRef<Path>,
    details: &MeetingDetails,
    mut session: Option<&mut PersistentSession>,
) -> Result<Submission, MinutesError> {
    let path = path.as_ref();
    info!("Submitting recording {}", path.display());

    // ── Step 1: Upload ───────────────────────────────────────────────────
    persist(&mut session, Session::reset_for_upload)?;
    let meeting = match client.upload_meeting(path).await {
        Ok(m) => m,
        Err(e) => return Err(record_failure(&mut session, e)),
    };
    let meeting_id = meeting.id.clone();
    persist(&mut session, |s| s.meeting_id = Some(meeting_id))?;

    // ── Step 2: Title and participants ───────────────────────────────────
    if details.is_empty() {
        debug!("No meeting details to save; skipping update");
    } else {
        if let Err(e) = client.update_meeting(&meeting.id, details).await {
            return Err(record_failure(&mut session, e));
        }
        persist(&mut session, |s| {
            s.title = details.title.clone().unwrap_or_default();
            s.participants = details
                .participants
                .as_deref()
                .map(|p| p.split("; ").map(str::to_string).collect())
                .unwrap_or_default();
        })?;
    }

    // ── Step 3: Create task ──────────────────────────────────────────────
    let created = match client.create_task(&meeting.id).await {
        Ok(c) => c,
        Err(e) => return Err(record_failure(&mut session, e)),
    };
    persist(&mut session, |s| s.begin_processing(&created.id))?;

    Ok(Submission {
        meeting,
        task_id: created.id,
    })
}

/// Poll `task_id` to completion, recording every status in the session.
///
/// A failed task leaves its message in the session; a transport failure
/// leaves the generic polling message. Either way the processing flag is
/// cleared.
pub async fn wait_for_task(
    client: &ApiClient,
    task_id: &str,
    mut session: Option<&mut PersistentSession>,
    progress: Option<ProgressCallback>,
) -> Result<TaskCompletion, MinutesError> {
    let mut poller = TaskPoller::new(client.clone(), client.config().poll_interval());
    if let Some(cb) = progress {
        poller = poller.with_progress(cb);
    }

    let mut steps = Vec::new();
    let mut statuses = poller.watch(task_id);
    while let Some(item) = statuses.next().await {
        match item {
            Ok(snapshot) => {
                steps.push(snapshot.step);
                persist(&mut session, |s| s.record_snapshot(&snapshot))?;
                if snapshot.status == TaskStatus::Complete {
                    persist(&mut session, Session::finish_processing)?;
                    return Ok(TaskCompletion {
                        task_id: task_id.to_string(),
                        ticks: steps.len(),
                        steps,
                    });
                }
            }
            Err(e) => {
                let failed = matches!(e, MinutesError::TaskFailed { .. });
                let message = match &e {
                    MinutesError::TaskFailed { message, .. } => message.clone(),
                    _ => GENERIC_POLLING_FAILURE.to_string(),
                };
                let recorded = persist(&mut session, |s| {
                    if failed {
                        s.status = Some(TaskStatus::Failed.to_string());
                        s.current_step = TaskStatus::Failed.step();
                    }
                    s.fail(message)
                });
                if let Err(save_err) = recorded {
                    warn!("Could not record failure in session: {}", save_err);
                }
                return Err(e);
            }
        }
    }

    Err(MinutesError::Internal(format!(
        "status stream for task {task_id} ended without a terminal status"
    )))
}

/// Upload a recording and, when `wait` is set, poll its task to completion.
///
/// # Errors
/// Whatever step failed first: input validation, upload, meeting update,
/// task creation, or polling.
pub async fn process_recording(
    client: &ApiClient,
    path: impl AsRef<Path>,
    details: &MeetingDetails,
    mut session: Option<&mut PersistentSession>,
    wait: bool,
    progress: Option<ProgressCallback>,
) -> Result<ProcessingOutput, MinutesError> {
    let submission = submit_recording(client, path, details, session.as_deref_mut()).await?;
    if !wait {
        info!("Task {} queued; not waiting", submission.task_id);
        return Ok(ProcessingOutput {
            meeting: submission.meeting,
            task_id: submission.task_id,
            outcome: ProcessingOutcome::Queued,
        });
    }

    let completion = wait_for_task(client, &submission.task_id, session, progress).await?;
    Ok(ProcessingOutput {
        meeting: submission.meeting,
        task_id: submission.task_id,
        outcome: ProcessingOutcome::Completed(completion),
    })
}

/// Restart polling for a session left mid-processing.
///
/// Returns `Ok(None)` when the session has nothing to resume.
pub async fn resume(
    client: &ApiClient,
    session: &mut PersistentSession,
    progress: Option<ProgressCallback>,
) -> Result<Option<TaskCompletion>, MinutesError> {
    let Some(task_id) = session.get().resumable_task().map(str::to_string) else {
        debug!("Session has no task in progress");
        return Ok(None);
    };
    info!("Resuming task {}", task_id);
    wait_for_task(client, &task_id, Some(session), progress)
        .await
        .map(Some)
}

fn require_meeting(session: &PersistentSession) -> Result<String, MinutesError> {
    session.get().meeting_id.clone().ok_or(MinutesError::NoMeeting)
}

/// The meeting's transcript, fetched once and then served from the session.
pub async fn fetch_transcript(
    client: &ApiClient,
    session: &mut PersistentSession,
) -> Result<String, MinutesError> {
    let meeting_id = require_meeting(session)?;
    if let Some(cached) = session.get().transcript.clone() {
        debug!("Using cached transcript for {}", meeting_id);
        session.update(|s| s.show(DocumentKind::Transcript, cached.clone()))?;
        return Ok(cached);
    }

    let transcript = match client.get_transcript(&meeting_id).await {
        Ok(t) => t,
        Err(e) => return Err(record_failure(&mut Some(session), e)),
    };
    let text = transcript.full_text;
    session.update(|s| {
        s.transcript = Some(text.clone());
        s.show(DocumentKind::Transcript, text.clone());
    })?;
    Ok(text)
}

/// The meeting's metadata as a markdown table, cached like the transcript.
pub async fn fetch_meeting_info(
    client: &ApiClient,
    session: &mut PersistentSession,
) -> Result<String, MinutesError> {
    let meeting_id = require_meeting(session)?;
    if let Some(cached) = session.get().meeting_info.clone() {
        debug!("Using cached meeting info for {}", meeting_id);
        session.update(|s| s.show(DocumentKind::Info, cached.clone()))?;
        return Ok(cached);
    }

    let meeting = match client.get_meeting(&meeting_id).await {
        Ok(m) => m,
        Err(e) => return Err(record_failure(&mut Some(session), e)),
    };
    let table = meeting_info_table(&meeting);
    session.update(|s| {
        s.meeting_info = Some(table.clone());
        s.show(DocumentKind::Info, table.clone());
    })?;
    Ok(table)
}

/// Fetch the minutes, strip their code fence and paginate them.
///
/// Minutes are always fetched fresh: they may still be regenerating.
pub async fn fetch_minutes(
    client: &ApiClient,
    session: &mut PersistentSession,
    paginator: &Paginator,
) -> Result<MinutesDocument, MinutesError> {
    let meeting_id = require_meeting(session)?;
    let minutes = match client.get_minutes(&meeting_id).await {
        Ok(m) => m,
        Err(e) => return Err(record_failure(&mut Some(session), e)),
    };

    let markdown = clean_minutes(&minutes.md_text);
    let pages = paginator.pages(&markdown);
    debug!(
        "Minutes for {}: {} lines, {} pages",
        meeting_id,
        markdown.lines().count(),
        pages.len()
    );

    session.update(|s| {
        s.minutes = Some(minutes.clone());
        s.show(DocumentKind::Minutes, markdown.clone());
    })?;

    Ok(MinutesDocument {
        minutes,
        markdown,
        pages,
    })
}

/// File name used when the caller gives no output path.
pub fn default_download_name(meeting_id: &str, format: DownloadFormat) -> PathBuf {
    PathBuf::from(format!("minutes_{meeting_id}.{}", format.extension()))
}

/// Download the rendered minutes and write them atomically to `output`.
///
/// Returns the number of bytes written. A failure is also left as the
/// session's error when a session is given.
pub async fn download_to_file(
    client: &ApiClient,
    meeting_id: &str,
    format: DownloadFormat,
    output: impl AsRef<Path>,
    mut session: Option<&mut PersistentSession>,
) -> Result<usize, MinutesError> {
    let bytes = client
        .download_minutes(meeting_id, format)
        .await
        .map_err(|e| record_failure(&mut session, e))?;
    let path = output.as_ref();
    write_atomic(path, &bytes).map_err(|e| record_failure(&mut session, e))?;
    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes.len())
}

/// Delete the session's meeting on the backend and forget it locally.
pub async fn delete_meeting(
    client: &ApiClient,
    session: &mut PersistentSession,
) -> Result<String, MinutesError> {
    let meeting_id = require_meeting(session)?;
    client.delete_meeting(&meeting_id).await?;
    session.update(Session::reset_for_upload)?;
    Ok(meeting_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;

    #[test]
    fn default_download_name_uses_extension() {
        assert_eq!(
            default_download_name("m-7", DownloadFormat::Docx),
            PathBuf::from("minutes_m-7.docx")
        );
    }

    #[tokio::test]
    async fn fetches_without_meeting_fail_fast() {
        let dir = tempfile::tempdir().unwrap();
        let mut session =
            PersistentSession::open(SessionStore::new(dir.path().join("s.json"))).unwrap();
        let config = crate::ClientConfig::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let client = ApiClient::new(&config).unwrap();

        let err = fetch_transcript(&client, &mut session).await.unwrap_err();
        assert!(matches!(err, MinutesError::NoMeeting));
        let err = fetch_minutes(&client, &mut session, &Paginator::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MinutesError::NoMeeting));
    }

    #[tokio::test]
    async fn cached_transcript_needs_no_request() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("s.json"));
        let mut session = PersistentSession::open(store.clone()).unwrap();
        session
            .update(|s| {
                s.meeting_id = Some("m-1".into());
                s.transcript = Some("hello world".into());
            })
            .unwrap();

        // Nothing listens on port 9; a request would fail.
        let config = crate::ClientConfig::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let client = ApiClient::new(&config).unwrap();

        let text = fetch_transcript(&client, &mut session).await.unwrap();
        assert_eq!(text, "hello world");
        let on_disk = store.load().unwrap();
        assert_eq!(on_disk.doc, "hello world");
        assert_eq!(on_disk.last_fetched, Some(DocumentKind::Transcript));
    }

    #[tokio::test]
    async fn resume_without_task_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut session =
            PersistentSession::open(SessionStore::new(dir.path().join("s.json"))).unwrap();
        let client = ApiClient::new(&crate::ClientConfig::default()).unwrap();
        assert_eq!(resume(&client, &mut session, None).await.unwrap(), None);
    }
}
