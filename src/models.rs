//! Wire types for the `/api/v2` endpoints.
//!
//! Only the fields the client reads are required; everything else the
//! backend sends is optional or ignored so that additive backend changes do
//! not break decoding.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A meeting record as returned by `GET /api/v2/meetings/{id}` and the upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub participants: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub size_mb: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Body of `PATCH /api/v2/meetings/{id}`.
///
/// `None` fields are sent as `null`, which the backend treats as "leave
/// unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDetails {
    pub title: Option<String>,
    pub participants: Option<String>,
}

impl MeetingDetails {
    /// Build the patch body from a title and a participant list.
    ///
    /// Blank entries are dropped; participants are joined with `"; "`.
    pub fn new(title: Option<&str>, participants: &[String]) -> Self {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let joined = participants
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            title,
            participants: (!joined.is_empty()).then_some(joined),
        }
    }

    /// True when there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.participants.is_none()
    }
}

/// Minimal `{ id }` answer of the create endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub id: String,
}

/// A processing task as returned by `GET /api/v2/tasks/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Server-side task status.
///
/// Statuses the client does not know are kept verbatim in
/// [`TaskStatus::Unknown`]; they map to step -1 and do not end polling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    Processing,
    Converting,
    Transcribing,
    Generating,
    Complete,
    Failed,
    Unknown(String),
}

/// Number of non-terminal progress steps (pending through generating).
pub const PROCESS_STEP_COUNT: i32 = 5;

impl TaskStatus {
    /// Progress step shown to the user, or -1 outside the running steps.
    ///
    /// | status       | step |
    /// |--------------|------|
    /// | pending      | 0    |
    /// | processing   | 1    |
    /// | converting   | 2    |
    /// | transcribing | 3    |
    /// | generating   | 4    |
    /// | complete     | -1   |
    /// | failed       | -1   |
    /// | other        | -1   |
    pub fn step(&self) -> i32 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Processing => 1,
            TaskStatus::Converting => 2,
            TaskStatus::Transcribing => 3,
            TaskStatus::Generating => 4,
            TaskStatus::Complete | TaskStatus::Failed | TaskStatus::Unknown(_) => -1,
        }
    }

    /// `complete` or `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Converting => "converting",
            TaskStatus::Transcribing => "transcribing",
            TaskStatus::Generating => "generating",
            TaskStatus::Complete => "complete",
            TaskStatus::Failed => "failed",
            TaskStatus::Unknown(s) => s,
        }
    }

    /// Human-readable label of the step, used by progress displays.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Request accepted",
            TaskStatus::Processing => "Analysing data",
            TaskStatus::Converting => "Preparing media",
            TaskStatus::Transcribing => "Transcribing",
            TaskStatus::Generating => "Writing minutes",
            TaskStatus::Complete => "Done",
            TaskStatus::Failed => "Failed",
            TaskStatus::Unknown(_) => "Unknown status",
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(s: &str) -> Self {
        match s {
            "pending" => TaskStatus::Pending,
            "processing" => TaskStatus::Processing,
            "converting" => TaskStatus::Converting,
            "transcribing" => TaskStatus::Transcribing,
            "generating" => TaskStatus::Generating,
            "complete" => TaskStatus::Complete,
            "failed" => TaskStatus::Failed,
            other => TaskStatus::Unknown(other.to_string()),
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        TaskStatus::from(s.as_str())
    }
}

impl From<TaskStatus> for String {
    fn from(s: TaskStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transcript of a meeting recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub full_text: String,
    #[serde(default)]
    pub words_count: Option<u64>,
}

/// Generated meeting minutes, markdown formatted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Minutes {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub meeting_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub md_text: String,
}

/// File formats the minutes can be downloaded in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    #[default]
    Pdf,
    Docx,
    Md,
}

impl DownloadFormat {
    /// Value of the `extension` query parameter and the file suffix.
    pub fn extension(&self) -> &'static str {
        match self {
            DownloadFormat::Pdf => "pdf",
            DownloadFormat::Docx => "docx",
            DownloadFormat::Md => "md",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_table() {
        let steps: Vec<i32> = [
            "pending",
            "processing",
            "converting",
            "transcribing",
            "generating",
            "complete",
            "failed",
            "queued",
        ]
        .into_iter()
        .map(|s| TaskStatus::from(s).step())
        .collect();
        assert_eq!(steps, vec![0, 1, 2, 3, 4, -1, -1, -1]);
    }

    #[test]
    fn unknown_status_is_preserved_and_not_terminal() {
        let status = TaskStatus::from("archiving");
        assert_eq!(status.as_str(), "archiving");
        assert!(!status.is_terminal());
    }

    #[test]
    fn task_decodes_with_missing_error_message() {
        let task: Task = serde_json::from_str(r#"{"status":"generating"}"#).unwrap();
        assert_eq!(task.status, TaskStatus::Generating);
        assert!(task.error_message.is_none());
    }

    #[test]
    fn status_serialises_as_plain_string() {
        let json = serde_json::to_string(&TaskStatus::Transcribing).unwrap();
        assert_eq!(json, "\"transcribing\"");
    }

    #[test]
    fn details_join_participants_and_drop_blanks() {
        let d = MeetingDetails::new(
            Some("  Weekly sync "),
            &["Anna".to_string(), " ".to_string(), "Boris".to_string()],
        );
        assert_eq!(d.title.as_deref(), Some("Weekly sync"));
        assert_eq!(d.participants.as_deref(), Some("Anna; Boris"));
    }

    #[test]
    fn empty_details() {
        let d = MeetingDetails::new(Some(""), &[]);
        assert!(d.is_empty());
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json, serde_json::json!({"title": null, "participants": null}));
    }
}
