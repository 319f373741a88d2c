//! Atomic file writes shared by the session store and minutes downloads.

use crate::error::MinutesError;
use std::io::Write;
use std::path::Path;

/// Write `bytes` to `path` through a temp file in the same directory and a
/// rename, so readers never observe a half-written file.
///
/// Missing parent directories are created.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MinutesError> {
    let fail = |source: std::io::Error| MinutesError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(fail)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.flush().map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}
