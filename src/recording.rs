//! Local recording checks performed before an upload is attempted.
//!
//! The backend only transcribes audio it can decode, and a failed upload of
//! a multi-hundred-megabyte file is slow to find out about. Checking the path
//! and the extension locally turns the common mistakes into an immediate,
//! specific error.

use crate::error::MinutesError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions the backend accepts, lower-case, without the dot.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["mp3", "wav", "m4a"];

/// A recording that passed the local checks.
#[derive(Debug, Clone)]
pub struct Recording {
    pub path: PathBuf,
    /// File name sent as the multipart `filename`.
    pub file_name: String,
    /// MIME type sent with the multipart part.
    pub mime: &'static str,
}

/// Validate that `path` is a readable recording in an accepted format.
pub fn resolve_recording(path: impl AsRef<Path>) -> Result<Recording, MinutesError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(MinutesError::FileNotFound { path });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let mime = match extension.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        _ => return Err(MinutesError::UnsupportedMedia { path }),
    };

    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(MinutesError::PermissionDenied { path });
        }
        Err(_) => return Err(MinutesError::FileNotFound { path }),
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("recording")
        .to_string();

    debug!("Resolved recording: {} ({})", path.display(), mime);
    Ok(Recording {
        path,
        file_name,
        mime,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve_recording("/definitely/not/here.mp3").unwrap_err();
        assert!(matches!(err, MinutesError::FileNotFound { .. }));
    }

    #[test]
    fn rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        let err = resolve_recording(&path).unwrap_err();
        assert!(matches!(err, MinutesError::UnsupportedMedia { .. }));
    }

    #[test]
    fn accepts_upper_case_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("standup.M4A");
        std::fs::write(&path, b"\0\0\0\x18ftypM4A ").unwrap();
        let rec = resolve_recording(&path).unwrap();
        assert_eq!(rec.file_name, "standup.M4A");
        assert_eq!(rec.mime, "audio/mp4");
    }
}
