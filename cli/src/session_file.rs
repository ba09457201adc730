use std::path::Path;

use anyhow::{Context, Result};
use transcript_engine::{GradingScale, SessionDocument};
use transcript_utils::{PersistOptions, persist_atomically, recover_backup};

/// Reads and validates the session document at `path`.
pub fn load(path: &Path, scale: &GradingScale) -> Result<SessionDocument> {
    recover_backup(path);
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session file {}", path.display()))?;
    let document = SessionDocument::from_json_str(&raw, scale)
        .with_context(|| format!("invalid session file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded session file");
    Ok(document)
}

/// Writes `document` back to `path`, replacing the old file atomically.
pub fn save(path: &Path, document: &SessionDocument) -> Result<()> {
    let mut json = document
        .to_json_pretty()
        .context("failed to serialize session document")?;
    json.push('\n');
    persist_atomically(path, json.as_bytes(), PersistOptions::default())
        .with_context(|| format!("failed to write session file {}", path.display()))?;
    tracing::info!(path = %path.display(), "Saved session file");
    Ok(())
}
