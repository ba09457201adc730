//! The persisted session document.
//!
//! A document is loaded once at session start, mutated in place by the engine,
//! and handed back to the persistence layer as a snapshot. Optional collections
//! load as empty (absent and `null` are treated alike) and are always written
//! back as empty arrays, never omitted. Keys this schema does not know about
//! are carried through unchanged.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::view::FilterSpecWire;
use crate::{CourseDraft, CourseRecord, FilterSpec, GradingScale, SchemaError, SortSpec};

const OWNER_ID: &str = "owner_id";
const PARSING_TYPE: &str = "parsing_type";
const PARSING_LANGUAGE: &str = "parsing_language";
const MANAGER_DATE: &str = "transcript_manager_date";
const CREATION_DATE: &str = "transcript_creation_date";
const SEMESTERS: &str = "semesters";
const ORIGINAL: &str = "original_course_list";
const FILTERING: &str = "filtering";
const SORTING: &str = "sorting";
const MODIFIED: &str = "modified_course_list";
const DOCUMENT_NAME: &str = "document_name";
const UPDATED: &str = "updated_course_list";
const SUBTRACTED: &str = "subtracted_course_list";
const ADDED: &str = "added_course_list";

/// Identity and provenance fields supplied by the transcript parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionMetadata {
    pub owner_id: String,
    pub parsing_type: String,
    pub parsing_language: String,
    pub transcript_manager_date: String,
    pub transcript_creation_date: String,
    /// Semester breakdown; its shape belongs to the parser.
    pub semesters: Value,
    pub document_name: String,
}

/// A removed course. Entries read from older documents may carry only the code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtractedEntry {
    pub code: String,
    pub record: Option<CourseRecord>,
}

impl SubtractedEntry {
    #[must_use]
    pub fn of(record: CourseRecord) -> Self {
        Self {
            code: record.code().to_string(),
            record: Some(record),
        }
    }
}

impl Serialize for SubtractedEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.record {
            Some(record) => record.serialize(serializer),
            None => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("course_code", &self.code)?;
                map.end()
            }
        }
    }
}

/// User intent since the baseline, in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditLog {
    pub added: Vec<CourseRecord>,
    pub subtracted: Vec<SubtractedEntry>,
    pub updated: Vec<CourseRecord>,
}

impl EditLog {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.subtracted.is_empty() && self.updated.is_empty()
    }

    #[must_use]
    pub fn is_added(&self, code: &str) -> bool {
        self.added.iter().any(|record| record.code() == code)
    }

    #[must_use]
    pub fn is_subtracted(&self, code: &str) -> bool {
        self.subtracted.iter().any(|entry| entry.code == code)
    }

    #[must_use]
    pub fn is_updated(&self, code: &str) -> bool {
        self.updated.iter().any(|record| record.code() == code)
    }
}

/// Baseline, edit log, view specs and cached working list for one transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDocument {
    pub metadata: SessionMetadata,
    baseline: Vec<CourseRecord>,
    pub log: EditLog,
    pub filtering: Vec<FilterSpec>,
    pub sorting: SortSpec,
    /// Cached working list. The engine derives it; it is never the source of truth.
    pub working: Vec<CourseRecord>,
    extra: Map<String, Value>,
}

impl SessionDocument {
    /// Starts a fresh session over a parsed baseline.
    pub fn new(
        metadata: SessionMetadata,
        baseline: Vec<CourseRecord>,
    ) -> Result<Self, SchemaError> {
        ensure_unique_codes(&baseline)?;
        Ok(Self {
            metadata,
            working: baseline.clone(),
            baseline,
            log: EditLog::default(),
            filtering: Vec::new(),
            sorting: SortSpec::default(),
            extra: Map::new(),
        })
    }

    pub fn from_json_str(raw: &str, scale: &GradingScale) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(raw).map_err(SchemaError::Malformed)?;
        Self::from_value(value, scale)
    }

    pub fn from_value(value: Value, scale: &GradingScale) -> Result<Self, SchemaError> {
        let Value::Object(mut map) = value else {
            return Err(SchemaError::NotAnObject);
        };

        let metadata = SessionMetadata {
            owner_id: required(&mut map, OWNER_ID)?,
            parsing_type: required(&mut map, PARSING_TYPE)?,
            parsing_language: required(&mut map, PARSING_LANGUAGE)?,
            transcript_manager_date: required(&mut map, MANAGER_DATE)?,
            transcript_creation_date: required(&mut map, CREATION_DATE)?,
            semesters: take_required(&mut map, SEMESTERS)?,
            document_name: required(&mut map, DOCUMENT_NAME)?,
        };

        let baseline = course_list(take_required(&mut map, ORIGINAL)?, ORIGINAL, scale)?;
        ensure_unique_codes(&baseline)?;

        let log = EditLog {
            added: optional_course_list(&mut map, ADDED, scale)?,
            subtracted: match take_optional(&mut map, SUBTRACTED) {
                Some(value) => subtracted_list(value, scale)?,
                None => Vec::new(),
            },
            updated: optional_course_list(&mut map, UPDATED, scale)?,
        };

        let filtering = match take_optional(&mut map, FILTERING) {
            Some(value) => filter_list(value)?,
            None => Vec::new(),
        };
        let sorting = match take_optional(&mut map, SORTING) {
            Some(value) => serde_json::from_value(value).map_err(|source| {
                SchemaError::InvalidField {
                    field: SORTING,
                    source,
                }
            })?,
            None => SortSpec::default(),
        };
        let working = optional_course_list(&mut map, MODIFIED, scale)?;

        Ok(Self {
            metadata,
            baseline,
            log,
            filtering,
            sorting,
            working,
            extra: map,
        })
    }

    /// The immutable replay root.
    #[must_use]
    pub fn baseline(&self) -> &[CourseRecord] {
        &self.baseline
    }

    /// Top-level keys this schema does not recognise, preserved for round-trip.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for SessionDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(14 + self.extra.len()))?;
        map.serialize_entry(OWNER_ID, &self.metadata.owner_id)?;
        map.serialize_entry(PARSING_TYPE, &self.metadata.parsing_type)?;
        map.serialize_entry(PARSING_LANGUAGE, &self.metadata.parsing_language)?;
        map.serialize_entry(MANAGER_DATE, &self.metadata.transcript_manager_date)?;
        map.serialize_entry(CREATION_DATE, &self.metadata.transcript_creation_date)?;
        map.serialize_entry(SEMESTERS, &self.metadata.semesters)?;
        map.serialize_entry(ORIGINAL, &self.baseline)?;
        map.serialize_entry(FILTERING, &self.filtering)?;
        map.serialize_entry(SORTING, &self.sorting)?;
        map.serialize_entry(MODIFIED, &self.working)?;
        map.serialize_entry(DOCUMENT_NAME, &self.metadata.document_name)?;
        map.serialize_entry(UPDATED, &self.log.updated)?;
        map.serialize_entry(SUBTRACTED, &self.log.subtracted)?;
        map.serialize_entry(ADDED, &self.log.added)?;
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

fn take_required(map: &mut Map<String, Value>, field: &'static str) -> Result<Value, SchemaError> {
    map.remove(field).ok_or(SchemaError::MissingField { field })
}

fn required<T: DeserializeOwned>(
    map: &mut Map<String, Value>,
    field: &'static str,
) -> Result<T, SchemaError> {
    let value = take_required(map, field)?;
    serde_json::from_value(value).map_err(|source| SchemaError::InvalidField { field, source })
}

fn take_optional(map: &mut Map<String, Value>, field: &'static str) -> Option<Value> {
    map.remove(field).filter(|value| !value.is_null())
}

fn array(value: Value, field: &'static str) -> Result<Vec<Value>, SchemaError> {
    serde_json::from_value(value).map_err(|source| SchemaError::InvalidField { field, source })
}

fn course_list(
    value: Value,
    list: &'static str,
    scale: &GradingScale,
) -> Result<Vec<CourseRecord>, SchemaError> {
    array(value, list)?
        .into_iter()
        .enumerate()
        .map(|(index, raw)| course(raw, list, index, scale))
        .collect()
}

fn optional_course_list(
    map: &mut Map<String, Value>,
    list: &'static str,
    scale: &GradingScale,
) -> Result<Vec<CourseRecord>, SchemaError> {
    match take_optional(map, list) {
        Some(value) => course_list(value, list, scale),
        None => Ok(Vec::new()),
    }
}

fn course(
    raw: Value,
    list: &'static str,
    index: usize,
    scale: &GradingScale,
) -> Result<CourseRecord, SchemaError> {
    let draft: CourseDraft = serde_json::from_value(raw)
        .map_err(|source| SchemaError::MalformedRecord {
            list,
            index,
            source,
        })?;
    draft
        .build(scale)
        .map_err(|source| SchemaError::InvalidRecord {
            list,
            index,
            source,
        })
}

fn subtracted_list(value: Value, scale: &GradingScale) -> Result<Vec<SubtractedEntry>, SchemaError> {
    #[derive(serde::Deserialize)]
    struct CodeOnly {
        course_code: String,
    }

    array(value, SUBTRACTED)?
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let code_only = raw.as_object().is_some_and(|entry| entry.len() == 1);
            if code_only {
                let CodeOnly { course_code } =
                    serde_json::from_value(raw).map_err(|source| SchemaError::MalformedRecord {
                        list: SUBTRACTED,
                        index,
                        source,
                    })?;
                Ok(SubtractedEntry {
                    code: course_code,
                    record: None,
                })
            } else {
                course(raw, SUBTRACTED, index, scale).map(SubtractedEntry::of)
            }
        })
        .collect()
}

fn filter_list(value: Value) -> Result<Vec<FilterSpec>, SchemaError> {
    let wires: Vec<FilterSpecWire> =
        serde_json::from_value(value).map_err(|source| SchemaError::InvalidField {
            field: FILTERING,
            source,
        })?;
    wires
        .into_iter()
        .enumerate()
        .map(|(index, wire)| {
            FilterSpec::from_json(wire.filter_key, &wire.allowed_values)
                .map_err(|source| SchemaError::InvalidFilter { index, source })
        })
        .collect()
}

fn ensure_unique_codes(records: &[CourseRecord]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.code()) {
            return Err(SchemaError::DuplicateBaselineCode {
                code: record.code().to_string(),
            });
        }
    }
    Ok(())
}
