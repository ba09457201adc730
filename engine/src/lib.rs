//! Core engine for the transcript workbench.
//!
//! Reconciles a working course list against its baseline through an edit log,
//! computes performance metrics for both views, and runs the one-shot
//! credential check that gates editing. No terminal or file IO beyond the
//! config loader lives here.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)]

mod action;
mod config;
mod filter;
mod performance;
mod reconcile;
mod replay;
mod sort;
mod verification;

pub use action::{ActionOutcome, SessionAction};
pub use config::{
    ConfigError, DEFAULT_ANIMATION_FRAMES, DEFAULT_POLL_INTERVAL_MS, GradeOverride,
    GradingConfig, StartupConfig, TranscriptConfig, VerificationConfig, config_path,
};
pub use filter::{apply_filters, available_filter_values, filter_by};
pub use performance::{
    DisplayMode, Metric, Performance, PerformanceComparison, Trend, calculate_performance,
};
pub use reconcile::{ChangeKind, ReconcileError, Reconciler};
pub use replay::replay;
pub use sort::{SortHistory, sort_by};
pub use verification::{
    AuthFailure, CredentialVerifier, LoadingAnimation, PollOutcome, VerificationFlow,
    VerificationRequest, VerifierError, drive,
};

pub use transcript_types::{
    CourseDraft, CourseField, CourseRecord, EditLog, FieldValue, FilterSpec, Grade, GradePoint,
    GradingScale, SchemaError, SessionDocument, SessionMetadata, SortSpec, ValidationError,
};
