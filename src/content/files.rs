//! Picture files in the uploads directory.
//!
//! File removal is not transactional. Callers remove files only after the
//! database rows referencing them are gone, so an interruption leaves
//! orphaned files that [`sweep_orphaned_files`] can collect later, never
//! rows pointing at missing files.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;

use super::error::{ContentError, Result};

/// Outcome of a best-effort file cleanup.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// Files that were deleted or were already absent.
    pub removed: Vec<String>,
    /// Files that could not be deleted, with the reason.
    pub failed: Vec<(String, String)>,
}

impl CleanupReport {
    /// Returns whether every file was cleaned up.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Checks that a stored file name is a plain name inside the uploads
/// directory.
///
/// # Errors
///
/// Returns [`ContentError::InvalidData`] for empty names, `.`/`..`, or
/// names containing path separators or NUL.
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(ContentError::InvalidData(format!(
            "Invalid picture file name: {name:?}"
        )));
    }
    Ok(())
}

/// Deletes the named files from `uploads_dir`.
///
/// Missing files count as removed. Failures are logged and reported rather
/// than aborting the cleanup.
pub fn remove_picture_files<S: AsRef<str>>(uploads_dir: &Path, names: &[S]) -> CleanupReport {
    let mut report = CleanupReport::default();

    for name in names {
        let name = name.as_ref();
        if let Err(e) = validate_file_name(name) {
            log::warn!("skipping removal of {name:?}: {e}");
            report.failed.push((name.to_string(), e.to_string()));
            continue;
        }

        match std::fs::remove_file(uploads_dir.join(name)) {
            Ok(()) => report.removed.push(name.to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => report.removed.push(name.to_string()),
            Err(e) => {
                log::warn!("failed to remove picture file {name}: {e}");
                report.failed.push((name.to_string(), e.to_string()));
            }
        }
    }

    report
}

/// Deletes regular files in `uploads_dir` that no picture references.
///
/// A missing uploads directory is treated as empty.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed. Individual removal
/// failures are reported in the returned [`CleanupReport`].
pub fn sweep_orphaned_files(uploads_dir: &Path, known: &HashSet<String>) -> Result<CleanupReport> {
    let entries = match std::fs::read_dir(uploads_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CleanupReport::default()),
        Err(e) => return Err(e.into()),
    };

    let mut orphans = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !known.contains(&name) {
            orphans.push(name);
        }
    }
    orphans.sort();

    let report = remove_picture_files(uploads_dir, &orphans);
    if !report.removed.is_empty() {
        log::info!(
            "swept {} orphaned picture file(s) from {}",
            report.removed.len(),
            uploads_dir.display()
        );
    }
    Ok(report)
}
