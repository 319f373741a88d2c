//! Persisted workspace session.
//!
//! The workspace keeps one snapshot of its state: which meeting and task it
//! is working on, the documents already fetched, what is being displayed, and
//! how far processing got. The snapshot is written as a single JSON file,
//! overwritten wholesale after every change, so an interrupted run (closed
//! terminal, Ctrl-C during polling, reboot) can pick up where it left off.
//!
//! A missing file is a fresh session. A file that does not parse is reported
//! rather than silently discarded, since it may hold the only copy of a
//! meeting id.

use crate::error::MinutesError;
use crate::io::write_atomic;
use crate::models::Minutes;
use crate::poll::PollSnapshot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Version written into new snapshots.
pub const SESSION_VERSION: u32 = 1;

/// File name used under the state directory.
pub const SESSION_FILE_NAME: &str = "session.json";

/// What the document pane shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    View,
    Edit,
    Analytics,
    Minutes,
}

/// Which document was fetched last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Transcript,
    Info,
    Minutes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// The full workspace snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub version: u32,
    pub meeting_id: Option<String>,
    pub task_id: Option<String>,
    pub transcript: Option<String>,
    /// Meeting metadata already rendered as a markdown table.
    pub meeting_info: Option<String>,
    pub minutes: Option<Minutes>,
    /// Text currently shown in the document pane.
    pub doc: String,
    pub mode: ViewMode,
    pub last_fetched: Option<DocumentKind>,
    pub messages: Vec<ChatMessage>,
    pub title: String,
    pub participants: Vec<String>,
    /// Last status string reported by the backend.
    pub status: Option<String>,
    /// Last progress step; -1 when nothing is running.
    pub current_step: i32,
    pub is_processing: bool,
    pub is_chat_open: bool,
    /// Last user-visible error.
    pub error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            version: SESSION_VERSION,
            meeting_id: None,
            task_id: None,
            transcript: None,
            meeting_info: None,
            minutes: None,
            doc: String::new(),
            mode: ViewMode::View,
            last_fetched: None,
            messages: Vec::new(),
            title: String::new(),
            participants: Vec::new(),
            status: None,
            current_step: -1,
            is_processing: false,
            is_chat_open: false,
            error: None,
        }
    }
}

impl Session {
    /// Forget everything tied to the previous recording before a new upload.
    ///
    /// Chat history, title and participants survive; they belong to the
    /// user, not to the recording.
    pub fn reset_for_upload(&mut self) {
        self.meeting_id = None;
        self.task_id = None;
        self.transcript = None;
        self.meeting_info = None;
        self.minutes = None;
        self.doc.clear();
        self.last_fetched = None;
        self.status = None;
        self.current_step = -1;
        self.is_processing = false;
        self.error = None;
    }

    /// Mark a freshly created task as running.
    pub fn begin_processing(&mut self, task_id: &str) {
        self.task_id = Some(task_id.to_string());
        self.is_processing = true;
        self.current_step = 0;
        self.doc.clear();
        self.transcript = None;
        self.error = None;
    }

    pub fn record_snapshot(&mut self, snapshot: &PollSnapshot) {
        self.status = Some(snapshot.status.to_string());
        self.current_step = snapshot.step;
    }

    pub fn finish_processing(&mut self) {
        self.is_processing = false;
    }

    /// Stop processing and remember the error shown to the user.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.is_processing = false;
        self.error = Some(message.into());
    }

    /// A session left mid-poll by an earlier run.
    pub fn resumable_task(&self) -> Option<&str> {
        if self.is_processing {
            self.task_id.as_deref()
        } else {
            None
        }
    }

    /// Put `text` in the document pane as the latest fetched `kind`.
    pub fn show(&mut self, kind: DocumentKind, text: impl Into<String>) {
        self.doc = text.into();
        self.last_fetched = Some(kind);
        self.mode = match kind {
            DocumentKind::Minutes => ViewMode::Minutes,
            DocumentKind::Transcript | DocumentKind::Info => ViewMode::View,
        };
    }

    pub fn push_message(&mut self, role: ChatRole, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            role,
            text: text.into(),
        });
    }

    /// Append a user message and open the chat pane.
    pub fn say(&mut self, text: impl Into<String>) {
        self.is_chat_open = true;
        self.push_message(ChatRole::User, text);
    }
}

/// Reads and writes the session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot; a missing file yields [`Session::default`].
    pub fn load(&self) -> Result<Session, MinutesError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session at {}; starting fresh", self.path.display());
                return Ok(Session::default());
            }
            Err(e) => {
                return Err(MinutesError::SessionCorrupt {
                    path: self.path.clone(),
                    detail: e.to_string(),
                })
            }
        };
        serde_json::from_str(&raw).map_err(|e| MinutesError::SessionCorrupt {
            path: self.path.clone(),
            detail: e.to_string(),
        })
    }

    /// Overwrite the snapshot.
    pub fn save(&self, session: &Session) -> Result<(), MinutesError> {
        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| MinutesError::Internal(format!("session encode: {e}")))?;
        write_atomic(&self.path, &json)?;
        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    /// Remove the snapshot file. Removing a missing file is not an error.
    pub fn clear(&self) -> Result<(), MinutesError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(MinutesError::OutputWriteFailed {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// A session bound to its store: every change goes straight to disk.
#[derive(Debug)]
pub struct PersistentSession {
    store: SessionStore,
    session: Session,
}

impl PersistentSession {
    /// Load the session behind `store`.
    pub fn open(store: SessionStore) -> Result<Self, MinutesError> {
        let session = store.load()?;
        Ok(Self { store, session })
    }

    pub fn get(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Apply `change` and write the result.
    pub fn update<F>(&mut self, change: F) -> Result<(), MinutesError>
    where
        F: FnOnce(&mut Session),
    {
        change(&mut self.session);
        self.store.save(&self.session)
    }
}

/// Default location of the session file.
///
/// `$XDG_STATE_HOME/meeting-minutes/session.json`, else
/// `$HOME/.local/state/meeting-minutes/session.json`, else
/// `./.meeting-minutes-session.json`.
pub fn default_session_path() -> PathBuf {
    let non_empty = |k: &str| std::env::var_os(k).filter(|v| !v.is_empty());
    if let Some(state) = non_empty("XDG_STATE_HOME") {
        return PathBuf::from(state)
            .join("meeting-minutes")
            .join(SESSION_FILE_NAME);
    }
    if let Some(home) = non_empty("HOME") {
        return PathBuf::from(home)
            .join(".local/state/meeting-minutes")
            .join(SESSION_FILE_NAME);
    }
    PathBuf::from(".meeting-minutes-session.json")
}
