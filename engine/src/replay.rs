//! Deterministic derivation of the working list from baseline plus edit log.

use tracing::{debug, warn};
use transcript_types::{CourseRecord, EditLog, FilterSpec, SortSpec};

use crate::filter::apply_filters;
use crate::sort::sort_by;

/// Rebuilds the working list: add, subtract, update, sort, filter.
///
/// The stage order is fixed. Steps that cannot apply are skipped, so replay
/// never fails:
/// - an added code already in the baseline keeps the baseline record
/// - a subtraction of an absent code does nothing
/// - an update of an absent code does nothing
#[must_use]
pub fn replay(
    baseline: &[CourseRecord],
    log: &EditLog,
    sort: SortSpec,
    filters: &[FilterSpec],
) -> Vec<CourseRecord> {
    let mut working = baseline.to_vec();

    for record in &log.added {
        if position(&working, record.code()).is_some() {
            debug!(code = record.code(), "Skipping added course already in baseline");
            continue;
        }
        working.push(record.clone());
    }

    for entry in &log.subtracted {
        match position(&working, &entry.code) {
            Some(index) => {
                working.remove(index);
            }
            None => warn!(code = %entry.code, "Skipping removal of a course that is not present"),
        }
    }

    for record in &log.updated {
        match position(&working, record.code()) {
            Some(index) => working[index] = record.clone(),
            // A removed course may still have earlier edits on record.
            None if log.is_subtracted(record.code()) => {
                debug!(code = record.code(), "Skipping update of a removed course");
            }
            None => warn!(code = record.code(), "Skipping update of a course that is not present"),
        }
    }

    sort_by(&mut working, sort);
    apply_filters(&mut working, filters);
    working
}

pub(crate) fn position(records: &[CourseRecord], code: &str) -> Option<usize> {
    records.iter().position(|record| record.code() == code)
}
