//! Moving files into per-day folders by modification date.

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Folder name for a file modified at `modified`, in local time.
#[must_use]
pub fn date_folder(modified: std::time::SystemTime) -> String {
    DateTime::<Local>::from(modified).format("%Y-%m-%d").to_string()
}

/// Moves every regular file directly under `base` into `base/<YYYY-MM-DD>/`.
///
/// Each move is echoed to `out` as `mv <src> <dir>`. A file that cannot be
/// moved is logged and left in place. Returns the new paths.
///
/// # Errors
///
/// Returns an error if `base` cannot be listed or `out` cannot be written.
pub fn organize_by_date<W: Write>(base: &Path, out: &mut W) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<_> = std::fs::read_dir(base)
        .map_err(Error::io("failed to read directory", base))?
        .collect::<std::io::Result<_>>()
        .map_err(Error::io("failed to read directory", base))?;
    entries.sort_by_key(std::fs::DirEntry::file_name);

    let mut moved = Vec::new();
    for entry in entries {
        let src = entry.path();
        let dir = match target_dir(base, &entry) {
            Ok(Some(dir)) => dir,
            Ok(None) => continue,
            Err(e) => {
                warn!(path = %src.display(), error = %e, "Failed to read file info");
                continue;
            }
        };

        writeln!(out, "mv {} {}", src.display(), dir.display())
            .map_err(Error::io("failed to write", "<stdout>"))?;

        let dst = dir.join(entry.file_name());
        let result = std::fs::create_dir_all(&dir)
            .map_err(Error::io("failed to create", &dir))
            .and_then(|()| std::fs::rename(&src, &dst).map_err(Error::io("failed to move", &src)));
        match result {
            Ok(()) => moved.push(dst),
            Err(e) => warn!(path = %src.display(), error = %e, "Failed to move file"),
        }
    }
    Ok(moved)
}

/// Returns the dated folder for a regular file, or `None` for anything else.
fn target_dir(base: &Path, entry: &std::fs::DirEntry) -> Result<Option<PathBuf>> {
    let src = entry.path();
    let file_type = entry.file_type().map_err(Error::io("failed to stat", &src))?;
    if !file_type.is_file() {
        return Ok(None);
    }
    let modified = entry
        .metadata()
        .and_then(|m| m.modified())
        .map_err(Error::io("failed to stat", &src))?;
    Ok(Some(base.join(date_folder(modified))))
}
