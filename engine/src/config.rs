use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use transcript_types::{Grade, GradePoint, GradeRule, GradingScale, ValidationError};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 20;
pub const DEFAULT_ANIMATION_FRAMES: usize = 12;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// `~/.transcript/config.toml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct TranscriptConfig {
    pub grading: Option<GradingConfig>,
    pub verification: Option<VerificationConfig>,
    pub startup: Option<StartupConfig>,
}

/// Overrides on top of the standard grading scale.
///
/// ```toml
/// [grading]
/// credits = [1, 2, 3, 4, 5, 6, 7, 8]
///
/// [grading.grades.W]
/// gpa_eligible = true
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct GradingConfig {
    /// Keyed by notation (`"A-"`, `"W"`, ...).
    #[serde(default)]
    pub grades: BTreeMap<String, GradeOverride>,
    pub credits: Option<Vec<u8>>,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct GradeOverride {
    pub weight: Option<f64>,
    pub successful: Option<bool>,
    pub gpa_eligible: Option<bool>,
}

impl GradingConfig {
    /// Applies the overrides to the standard scale and validates the result.
    pub fn to_scale(&self) -> Result<GradingScale, ValidationError> {
        let standard = GradingScale::standard();
        let mut rules: BTreeMap<Grade, GradeRule> = Grade::ALL
            .iter()
            .map(|&grade| (grade, standard.rule(grade)))
            .collect();

        for (notation, change) in &self.grades {
            let grade: Grade = notation.parse()?;
            let rule = rules.entry(grade).or_insert_with(|| standard.rule(grade));
            if let Some(weight) = change.weight {
                rule.weight = GradePoint::from_decimal(weight).ok_or_else(|| {
                    ValidationError::InvalidGradePoint {
                        raw: weight.to_string(),
                    }
                })?;
            }
            if let Some(successful) = change.successful {
                rule.successful = successful;
            }
            if let Some(gpa_eligible) = change.gpa_eligible {
                rule.gpa_eligible = gpa_eligible;
            }
        }

        let credits = match &self.credits {
            Some(credits) => credits.clone(),
            None => GradingScale::STANDARD_CREDITS.to_vec(),
        };
        GradingScale::new(rules, credits)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VerificationConfig {
    pub poll_interval_ms: Option<u64>,
    pub animation_frames: Option<usize>,
    /// External program that decides a credential check.
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

impl VerificationConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.poll_interval_ms
                .filter(|&ms| ms > 0)
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        )
    }

    #[must_use]
    pub fn animation_frames(&self) -> usize {
        self.animation_frames
            .filter(|&frames| frames > 0)
            .unwrap_or(DEFAULT_ANIMATION_FRAMES)
    }
}

/// Local resources checked and prepared before any session work.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StartupConfig {
    /// Must exist; a missing path aborts startup.
    #[serde(default)]
    pub required_paths: Vec<PathBuf>,
    /// Created if absent.
    #[serde(default)]
    pub working_dirs: Vec<PathBuf>,
    /// Removed at startup and shutdown, best effort.
    #[serde(default)]
    pub scratch_dirs: Vec<PathBuf>,
}

impl TranscriptConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        Self::load_from(&path)
    }

    /// Loads `path`, or `None` if it does not exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// The configured grading scale, or the standard one.
    pub fn grading_scale(&self) -> Result<GradingScale, ValidationError> {
        match &self.grading {
            Some(grading) => grading.to_scale(),
            None => Ok(GradingScale::standard()),
        }
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.verification
            .as_ref()
            .map_or(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS), VerificationConfig::poll_interval)
    }

    #[must_use]
    pub fn animation_frames(&self) -> usize {
        self.verification
            .as_ref()
            .map_or(DEFAULT_ANIMATION_FRAMES, VerificationConfig::animation_frames)
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".transcript").join("config.toml"))
}
