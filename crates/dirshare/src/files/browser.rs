//! Directory listing for rendered index pages.
//!
//! Only immediate children are listed. Hidden entries (names starting with
//! '.') are never shown, and per-entry metadata failures degrade to zero size
//! and epoch time instead of failing the listing.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use thiserror::Error;

use super::humanize::{human_size, human_time};
use super::resolver::DisplayPath;

/// Errors that can occur during directory browsing.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The directory could not be opened for reading.
    #[error("cannot read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Humanized size.
    pub size: String,
    /// Humanized modification time, relative to listing time.
    pub modified: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Display path of the entry, forward slashes, rooted.
    pub path: String,
}

/// Raw facts about a child before humanizing.
struct RawEntry {
    name: String,
    is_dir: bool,
    size: u64,
    modified: SystemTime,
}

/// List the visible children of `dir`.
///
/// `display` is the display path of `dir`; child paths are built from it.
/// Entries are ordered directories first, then by case-insensitive name.
pub fn list_entries(
    dir: &Path,
    display: &DisplayPath,
    now: SystemTime,
) -> Result<Vec<FileEntry>, BrowserError> {
    let entries = fs::read_dir(dir).map_err(|source| BrowserError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut raw = Vec::new();

    for entry_result in entries {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(path = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }

        // Follows symlinks, so a link to a directory lists as a directory.
        let (size, modified, meta_is_dir) = match fs::metadata(entry.path()) {
            Ok(m) => (
                m.len(),
                m.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                Some(m.is_dir()),
            ),
            Err(e) => {
                tracing::debug!(name = %name, error = %e, "metadata unavailable");
                (0, SystemTime::UNIX_EPOCH, None)
            }
        };

        let is_dir = meta_is_dir
            .or_else(|| entry.file_type().ok().map(|t| t.is_dir()))
            .unwrap_or(false);

        raw.push(RawEntry {
            name,
            is_dir,
            size,
            modified,
        });
    }

    sort_entries(&mut raw);

    Ok(raw
        .into_iter()
        .map(|r| FileEntry {
            path: display.join(&r.name).to_string(),
            size: human_size(r.size),
            modified: human_time(r.modified, now),
            is_dir: r.is_dir,
            name: r.name,
        })
        .collect())
}

/// Directories first, then case-insensitive name, exact name as tie-break.
fn sort_entries(entries: &mut [RawEntry]) {
    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.name.cmp(&b.name))
    });
}
