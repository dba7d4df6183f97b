//! Atomic calendar file output.

use std::io::Write;
use std::path::Path;

use tempfile::Builder;
use tracing::debug;

use crate::error::WriteError;

/// Write `contents` to `path` via a temporary file in the same directory.
///
/// The temporary file is renamed into place only after it has been fully
/// written and synced; on any failure it is removed and `path` is untouched.
pub fn write_calendar(path: &Path, contents: &str) -> Result<(), WriteError> {
    let wrap = |source: std::io::Error| WriteError {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = Builder::new()
        .prefix(".wcfav-")
        .suffix(".ics.tmp")
        .tempfile_in(dir)
        .map_err(wrap)?;
    file.write_all(contents.as_bytes()).map_err(wrap)?;
    file.as_file().sync_all().map_err(wrap)?;
    file.persist(path).map_err(|e| wrap(e.error))?;

    debug!(path = %path.display(), bytes = contents.len(), "wrote calendar");
    Ok(())
}
