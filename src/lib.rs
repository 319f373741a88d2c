//! # meeting-minutes
//!
//! Client for a meeting-minutes backend: upload an audio recording, follow the
//! server-side processing task until the minutes are generated, then read,
//! paginate or download them.
//!
//! ## Workflow Overview
//!
//! ```text
//! recording.mp3
//!  │
//!  ├─ 1. Upload    POST /api/v2/meetings/upload (multipart)
//!  ├─ 2. Annotate  PATCH /api/v2/meetings/{id}  (title, participants)
//!  ├─ 3. Queue     POST /api/v2/tasks
//!  ├─ 4. Poll      GET  /api/v2/tasks/{id} every 3 s until complete/failed
//!  ├─ 5. Read      transcript, meeting info, minutes
//!  └─ 6. Paginate  print pages that never split a markdown table
//! ```
//!
//! Every step can record its result in a [`PersistentSession`], a JSON
//! snapshot on disk, so an interrupted run can be resumed with
//! [`workflow::resume`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meeting_minutes::{process_recording, ApiClient, ClientConfig, MeetingDetails};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("http://localhost:8001")
//!         .build()?;
//!     let client = ApiClient::new(&config)?;
//!     let details = MeetingDetails::new(Some("Weekly sync"), &["Anna".into(), "Boris".into()]);
//!     let output = process_recording(&client, "sync.mp3", &details, None, true, None).await?;
//!     println!("meeting {} done (task {})", output.meeting.id, output.task_id);
//!     Ok(())
//! }
//! ```
//!
//! ## Pagination only
//!
//! The paginator is pure and needs no backend:
//!
//! ```rust
//! use meeting_minutes::Paginator;
//!
//! let pages = Paginator::new(2).paginate("text\n| a | b |\n|---|---|\n| 1 | 2 |\nmore");
//! assert_eq!(pages, vec!["text", "| a | b |\n|---|---|\n| 1 | 2 |", "more"]);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `minutes` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! meeting-minutes = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod io;
pub mod models;
pub mod poll;
pub mod progress;
pub mod recording;
pub mod session;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::ApiClient;
pub use config::{ClientConfig, ClientConfigBuilder, PageGeometry, DEFAULT_API_URL};
pub use document::paginate::{paginate, Page, Paginator};
pub use error::MinutesError;
pub use models::{
    Created, DownloadFormat, Meeting, MeetingDetails, Minutes, Task, TaskStatus, Transcript,
    PROCESS_STEP_COUNT,
};
pub use poll::{PollSnapshot, StatusStream, TaskCompletion, TaskPoller, TaskSource};
pub use progress::{NoopProgressCallback, PollProgressCallback, ProgressCallback};
pub use session::{default_session_path, PersistentSession, Session, SessionStore};
pub use workflow::{
    download_to_file, fetch_meeting_info, fetch_minutes, fetch_transcript, process_recording,
    resume, submit_recording, wait_for_task, MinutesDocument, ProcessingOutcome,
    ProcessingOutput, Submission,
};
