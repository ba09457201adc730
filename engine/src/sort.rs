//! Column sorting and the per-column direction toggle.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use transcript_types::{CourseField, CourseRecord, SortSpec};

/// Stable sort by the spec's column. A spec without a key leaves the order alone.
///
/// Reversal compares the other way round instead of reversing the output, so
/// records with equal keys keep their relative order in both directions.
pub fn sort_by(records: &mut [CourseRecord], spec: SortSpec) {
    let Some(field) = spec.key else {
        return;
    };
    if spec.reverse {
        records.sort_by(|a, b| compare(b, a, field));
    } else {
        records.sort_by(|a, b| compare(a, b, field));
    }
}

fn compare(a: &CourseRecord, b: &CourseRecord, field: CourseField) -> Ordering {
    match field {
        CourseField::Code => a.code().cmp(b.code()),
        CourseField::Name => a.name().cmp(b.name()),
        CourseField::Language => a.language().cmp(b.language()),
        CourseField::Credit => a.credit().cmp(&b.credit()),
        CourseField::Grade => a.grade().cmp(&b.grade()),
        CourseField::GradePoint => a.grade_point().cmp(&b.grade_point()),
    }
}

/// Remembers, per column, which direction the next request should sort in.
///
/// The first request for a column sorts ascending; each further request for
/// the same column flips it. Columns toggle independently.
#[derive(Debug, Clone, Default)]
pub struct SortHistory {
    next_reverse: BTreeMap<CourseField, bool>,
}

impl SortHistory {
    /// History in which `current` was the most recent request.
    #[must_use]
    pub fn seeded(current: SortSpec) -> Self {
        let mut history = Self::default();
        history.follow(current);
        history
    }

    /// Records a sort chosen outside of column clicks, so the next click on
    /// its column flips it. Other columns keep their state.
    pub fn follow(&mut self, spec: SortSpec) {
        if let Some(field) = spec.key {
            self.next_reverse.insert(field, !spec.reverse);
        }
    }

    /// Spec for a click on `field`, advancing that column's toggle.
    pub fn request(&mut self, field: CourseField) -> SortSpec {
        let next = self.next_reverse.entry(field).or_insert(false);
        let spec = SortSpec {
            key: Some(field),
            reverse: *next,
        };
        *next = !*next;
        spec
    }
}
