//! Environment checks before a session opens, and cleanup after it closes.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use transcript_engine::StartupConfig;

/// A startup precondition is unmet. The process must not continue.
#[derive(Debug, Error)]
pub enum EnvironmentFailure {
    #[error("required resources are missing: {}", display_paths(.0))]
    MissingResources(Vec<PathBuf>),
    #[error("could not create working directory {}: {source}", path.display())]
    WorkingDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Default)]
pub struct StartupChecklist {
    config: StartupConfig,
}

impl StartupChecklist {
    pub fn new(config: StartupConfig) -> Self {
        Self { config }
    }

    /// Clears scratch space, verifies required paths, then creates working
    /// directories. Fails on the first unmet precondition.
    pub fn prepare(&self) -> Result<(), EnvironmentFailure> {
        self.clean_scratch();

        let missing: Vec<PathBuf> = self
            .config
            .required_paths
            .iter()
            .filter(|path| !path.exists())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(EnvironmentFailure::MissingResources(missing));
        }

        for dir in &self.config.working_dirs {
            std::fs::create_dir_all(dir).map_err(|source| EnvironmentFailure::WorkingDir {
                path: dir.clone(),
                source,
            })?;
        }
        tracing::debug!(
            required = self.config.required_paths.len(),
            working = self.config.working_dirs.len(),
            "Startup checks passed"
        );
        Ok(())
    }

    /// Removes scratch directories. Never fails.
    pub fn clean_scratch(&self) {
        for dir in &self.config.scratch_dirs {
            remove_scratch_dir(dir);
        }
    }
}

fn remove_scratch_dir(dir: &Path) {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => tracing::debug!(path = %dir.display(), "Removed scratch directory"),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied) => {}
        Err(e) => {
            tracing::warn!(path = %dir.display(), "Failed to remove scratch directory: {e}");
        }
    }
}
