//! Filter and sort specifications for the working list.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CourseField, CourseRecord, FieldValue, ValidationError};

/// Keep records whose `field` value is one of `allowed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    #[serde(rename = "filter_key")]
    field: CourseField,
    #[serde(rename = "allowed_values")]
    allowed: BTreeSet<FieldValue>,
}

impl FilterSpec {
    #[must_use]
    pub fn new(field: CourseField, allowed: impl IntoIterator<Item = FieldValue>) -> Self {
        Self {
            field,
            allowed: allowed.into_iter().collect(),
        }
    }

    /// Builds a filter from user-entered values, typing each for `field`.
    pub fn parse<'a>(
        field: CourseField,
        raw_values: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ValidationError> {
        let allowed = raw_values
            .into_iter()
            .map(|raw| FieldValue::parse(field, raw))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { field, allowed })
    }

    /// Builds a filter from its persisted `{filter_key, allowed_values}` form.
    pub fn from_json(field: CourseField, raw_values: &[Value]) -> Result<Self, ValidationError> {
        let allowed = raw_values
            .iter()
            .map(|raw| FieldValue::from_json(field, raw))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { field, allowed })
    }

    #[must_use]
    pub fn field(&self) -> CourseField {
        self.field
    }

    #[must_use]
    pub fn allowed(&self) -> &BTreeSet<FieldValue> {
        &self.allowed
    }

    #[must_use]
    pub fn matches(&self, record: &CourseRecord) -> bool {
        self.allowed.contains(&record.value(self.field))
    }
}

/// Persisted shape of a filter, before its values are typed.
#[derive(Debug, Deserialize)]
pub(crate) struct FilterSpecWire {
    pub(crate) filter_key: CourseField,
    #[serde(default)]
    pub(crate) allowed_values: Vec<Value>,
}

/// Active sort column and direction. No key means "keep the current order".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "SortSpecWire")]
pub struct SortSpec {
    #[serde(rename = "sort_key")]
    pub key: Option<CourseField>,
    #[serde(rename = "should_reverse")]
    pub reverse: bool,
}

impl SortSpec {
    #[must_use]
    pub const fn ascending(key: CourseField) -> Self {
        Self {
            key: Some(key),
            reverse: false,
        }
    }

    #[must_use]
    pub const fn descending(key: CourseField) -> Self {
        Self {
            key: Some(key),
            reverse: true,
        }
    }
}

#[derive(Deserialize)]
struct SortSpecWire {
    #[serde(default)]
    sort_key: Option<CourseField>,
    #[serde(default)]
    should_reverse: Option<bool>,
}

impl From<SortSpecWire> for SortSpec {
    fn from(wire: SortSpecWire) -> Self {
        Self {
            key: wire.sort_key,
            reverse: wire.should_reverse.unwrap_or(false),
        }
    }
}
