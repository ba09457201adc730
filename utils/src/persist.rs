//! Crash-safe replacement of a file's contents.
//!
//! Bytes go to a temp file in the destination directory, which is then renamed
//! over the target. Where rename cannot replace an existing file, the old file
//! is first moved to `<name>.bak` and restored if the second rename fails.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// Flush to disk before the rename.
    Durable,
    /// Leave flushing to the OS.
    Relaxed,
}

#[derive(Debug, Clone, Copy)]
pub struct PersistOptions {
    pub file_sync: SyncPolicy,
    /// Also sync the parent directory after the rename (best effort, Unix only).
    pub sync_parent_dir: bool,
}

impl Default for PersistOptions {
    fn default() -> Self {
        Self {
            file_sync: SyncPolicy::Durable,
            sync_parent_dir: false,
        }
    }
}

/// `<path>.bak`, keeping the original extension (`session.json.bak`).
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(OsString::new, std::ffi::OsStr::to_os_string);
    name.push(".bak");
    path.with_file_name(name)
}

/// Restores `path` from its backup when a previous write was interrupted
/// between moving the old file aside and putting the new one in place.
///
/// Returns whether a backup was restored.
pub fn recover_backup(path: &Path) -> bool {
    let backup = backup_path(path);
    if path.exists() || !backup.exists() {
        return false;
    }
    match fs::rename(&backup, path) {
        Ok(()) => {
            tracing::warn!(
                path = %path.display(),
                "Restored session file from backup left by an interrupted write"
            );
            true
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "Failed to restore backup: {e}");
            false
        }
    }
}

/// Replaces the contents of `path` with `bytes` without ever leaving a
/// partially written file at `path`.
pub fn persist_atomically(
    path: impl AsRef<Path>,
    bytes: &[u8],
    options: PersistOptions,
) -> io::Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    if options.file_sync == SyncPolicy::Durable {
        tmp.as_file().sync_all()?;
    }

    if let Err(err) = tmp.persist(path) {
        if !path.exists() {
            return Err(err.error);
        }
        let backup = backup_path(path);
        let _ = fs::remove_file(&backup);
        fs::rename(path, &backup)?;

        if let Err(rename_err) = err.file.persist(path) {
            let _ = fs::rename(&backup, path);
            return Err(rename_err.error);
        }
        if let Err(e) = fs::remove_file(&backup) {
            tracing::warn!(path = %backup.display(), "Failed to remove backup after write: {e}");
        }
    }

    if options.sync_parent_dir {
        sync_dir(parent);
    }
    debug!(path = %path.display(), bytes = bytes.len(), "Persisted file");
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!(path = %dir.display(), "Directory sync failed (best-effort): {e}");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
