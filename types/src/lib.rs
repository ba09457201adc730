//! Core domain types for the transcript workbench.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod course;
mod grade;
mod session;
mod view;

pub use course::{CourseDraft, CourseField, CourseRecord, FieldValue};
pub use grade::{Credit, Grade, GradePoint, GradeRule, GradingScale};
pub use session::{EditLog, SessionDocument, SessionMetadata, SubtractedEntry};
pub use view::{FilterSpec, SortSpec};

use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// A course record or grading table carries a value outside its domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown grade notation {notation:?}")]
    UnknownGrade { notation: String },
    #[error("credit {credit} is not one of the allowed credit values")]
    CreditOutOfRange { credit: i64 },
    #[error("credit {raw:?} is not an integer")]
    InvalidCredit { raw: String },
    #[error("grade point {raw:?} is not a decimal between 0.00 and 4.00")]
    InvalidGradePoint { raw: String },
    #[error("course code must not be empty")]
    EmptyCode,
    #[error("unknown course field {name:?}")]
    UnknownField { name: String },
    #[error("value {raw} is not valid for {field}")]
    InvalidFieldValue { field: CourseField, raw: String },
    #[error("grading scale has no rule for grade {missing}")]
    IncompleteScale { missing: Grade },
    #[error("grade {grade} has weight {weight}, above the 4.00 maximum")]
    InvalidWeight { grade: Grade, weight: GradePoint },
    #[error("allowed credit set must be non-empty and positive")]
    InvalidCreditSet,
}

/// A session document does not match the expected schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("session document is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("session document must be a JSON object")]
    NotAnObject,
    #[error("session document is missing required field `{field}`")]
    MissingField { field: &'static str },
    #[error("session document field `{field}` has the wrong shape: {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("entry {index} of `{list}` is not a course record: {source}")]
    MalformedRecord {
        list: &'static str,
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("entry {index} of `{list}` is invalid: {source}")]
    InvalidRecord {
        list: &'static str,
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("filter {index} is invalid: {source}")]
    InvalidFilter {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("baseline course list contains code {code:?} more than once")]
    DuplicateBaselineCode { code: String },
}
