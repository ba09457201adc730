//! Value filters over course lists.

use std::collections::{BTreeMap, BTreeSet};

use transcript_types::{CourseField, CourseRecord, FieldValue, FilterSpec};

/// Records whose value for the filter's field is in its allowed set, in input order.
#[must_use]
pub fn filter_by(records: &[CourseRecord], spec: &FilterSpec) -> Vec<CourseRecord> {
    records
        .iter()
        .filter(|record| spec.matches(record))
        .cloned()
        .collect()
}

/// Applies every spec in sequence, which keeps only records matching all of them.
pub fn apply_filters(records: &mut Vec<CourseRecord>, specs: &[FilterSpec]) {
    for spec in specs {
        records.retain(|record| spec.matches(record));
    }
}

/// Distinct values present in `records` for each filterable field.
///
/// Values come back ascending: text fields lexicographically, credit and
/// grade point numerically.
#[must_use]
pub fn available_filter_values(records: &[CourseRecord]) -> BTreeMap<CourseField, Vec<FieldValue>> {
    CourseField::FILTERABLE
        .iter()
        .map(|&field| {
            let values: BTreeSet<FieldValue> =
                records.iter().map(|record| record.value(field)).collect();
            (field, values.into_iter().collect())
        })
        .collect()
}
