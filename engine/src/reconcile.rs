//! The reconciliation engine: edit-log bookkeeping over a session document.

use thiserror::Error;
use tracing::{debug, info};
use transcript_types::{
    CourseField, CourseRecord, EditLog, FilterSpec, GradingScale, SessionDocument, SortSpec,
    SubtractedEntry,
};

use crate::performance::PerformanceComparison;
use crate::replay::{position, replay};
use crate::sort::SortHistory;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("a course with code {code} is already in the list")]
    DuplicateKey { code: String },
    #[error("no course with code {code} is in the list")]
    NotFound { code: String },
}

/// How a working-list record differs from the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Unchanged,
}

/// Owns one session document and keeps its edit log, view specs and working
/// list consistent.
///
/// Every operation records its change in the log or view specs, then
/// re-derives the working list from the baseline by [`replay`].
#[derive(Debug)]
pub struct Reconciler {
    document: SessionDocument,
    scale: GradingScale,
    sort_history: SortHistory,
}

impl Reconciler {
    /// Opens a loaded document, deriving its working list from the log.
    #[must_use]
    pub fn open(mut document: SessionDocument, scale: GradingScale) -> Self {
        let derived = replay(
            document.baseline(),
            &document.log,
            document.sorting,
            &document.filtering,
        );
        if derived != document.working {
            debug!(
                cached = document.working.len(),
                derived = derived.len(),
                "Cached working list differs from replay; using replay"
            );
        }
        document.working = derived;

        info!(
            document = %document.metadata.document_name,
            courses = document.working.len(),
            "Opened transcript session"
        );
        Self {
            sort_history: SortHistory::seeded(document.sorting),
            document,
            scale,
        }
    }

    #[must_use]
    pub fn working(&self) -> &[CourseRecord] {
        &self.document.working
    }

    #[must_use]
    pub fn baseline(&self) -> &[CourseRecord] {
        self.document.baseline()
    }

    #[must_use]
    pub fn log(&self) -> &EditLog {
        &self.document.log
    }

    #[must_use]
    pub fn filters(&self) -> &[FilterSpec] {
        &self.document.filtering
    }

    #[must_use]
    pub fn sort_spec(&self) -> SortSpec {
        self.document.sorting
    }

    #[must_use]
    pub fn scale(&self) -> &GradingScale {
        &self.scale
    }

    /// The working-list record with `code`, if visible.
    #[must_use]
    pub fn record(&self, code: &str) -> Option<&CourseRecord> {
        self.document.working.iter().find(|record| record.code() == code)
    }

    /// Snapshot for persistence. The cached working list is always current.
    #[must_use]
    pub fn document(&self) -> &SessionDocument {
        &self.document
    }

    #[must_use]
    pub fn into_document(self) -> SessionDocument {
        self.document
    }

    /// Records a new course and re-derives the working list.
    ///
    /// Re-adding a removed baseline course drops its subtraction and records
    /// the new fields as an update, so a later rebuild keeps them. The course
    /// takes its sorted position and stays hidden if an active filter
    /// excludes it.
    pub fn add(&mut self, record: CourseRecord) -> Result<&[CourseRecord], ReconcileError> {
        let code = record.code().to_string();
        if self.is_known(&code) {
            return Err(ReconcileError::DuplicateKey { code });
        }

        let in_baseline = position(self.document.baseline(), &code).is_some();
        let log = &mut self.document.log;
        if log.is_subtracted(&code) {
            log.subtracted.retain(|entry| entry.code != code);
        }
        if in_baseline {
            log.updated.push(record);
        } else {
            log.added.push(record);
        }

        debug!(%code, restored = in_baseline, "Added course");
        Ok(self.resync())
    }

    /// Removes a visible course. A course added in this session leaves no
    /// trace in the log; a baseline course is always subtracted.
    pub fn remove(&mut self, code: &str) -> Result<&[CourseRecord], ReconcileError> {
        let Some(index) = position(&self.document.working, code) else {
            return Err(ReconcileError::NotFound {
                code: code.to_string(),
            });
        };
        let removed = self.document.working[index].clone();
        let in_baseline = position(self.document.baseline(), code).is_some();

        let log = &mut self.document.log;
        if log.is_added(code) {
            log.added.retain(|record| record.code() != code);
            if !in_baseline {
                log.updated.retain(|record| record.code() != code);
            }
        }
        if in_baseline {
            log.subtracted.push(SubtractedEntry::of(removed));
        }

        debug!(%code, subtracted = in_baseline, "Removed course");
        Ok(self.resync())
    }

    /// Replaces a visible course. An identical record changes nothing.
    pub fn update(&mut self, record: CourseRecord) -> Result<&[CourseRecord], ReconcileError> {
        self.apply_update(record)?;
        Ok(&self.document.working)
    }

    pub(crate) fn apply_update(&mut self, record: CourseRecord) -> Result<bool, ReconcileError> {
        let Some(index) = position(&self.document.working, record.code()) else {
            return Err(ReconcileError::NotFound {
                code: record.code().to_string(),
            });
        };
        if self.document.working[index] == record {
            debug!(code = record.code(), "Update is identical; nothing to record");
            return Ok(false);
        }

        debug!(code = record.code(), "Updated course");
        self.document.log.updated.push(record);
        self.resync();
        Ok(true)
    }

    /// Replaces the active filters and rebuilds.
    pub fn set_filters(&mut self, filters: Vec<FilterSpec>) -> &[CourseRecord] {
        self.document.filtering = filters;
        self.rebuild()
    }

    /// Narrows the active filters by one more spec and rebuilds.
    pub fn push_filter(&mut self, filter: FilterSpec) -> &[CourseRecord] {
        self.document.filtering.push(filter);
        self.rebuild()
    }

    pub fn clear_filters(&mut self) -> &[CourseRecord] {
        self.document.filtering.clear();
        self.rebuild()
    }

    /// Sets the sort and rebuilds. The column's toggle history follows it.
    pub fn set_sort(&mut self, spec: SortSpec) -> &[CourseRecord] {
        self.sort_history.follow(spec);
        self.document.sorting = spec;
        self.rebuild()
    }

    /// Column click: ascending first, then flipping on each repeat.
    pub fn sort_column(&mut self, field: CourseField) -> &[CourseRecord] {
        let spec = self.sort_history.request(field);
        self.document.sorting = spec;
        self.rebuild()
    }

    /// Re-derives the working list from baseline, log, sort and filters.
    pub fn rebuild(&mut self) -> &[CourseRecord] {
        self.resync();
        debug!(
            courses = self.document.working.len(),
            filters = self.document.filtering.len(),
            "Rebuilt working list"
        );
        &self.document.working
    }

    /// The working list is always the replay of the current log and specs.
    fn resync(&mut self) -> &[CourseRecord] {
        let document = &mut self.document;
        document.working = replay(
            document.baseline(),
            &document.log,
            document.sorting,
            &document.filtering,
        );
        &self.document.working
    }

    #[must_use]
    pub fn change_kind(&self, code: &str) -> ChangeKind {
        let log = &self.document.log;
        if log.is_updated(code) {
            ChangeKind::Updated
        } else if log.is_added(code) {
            ChangeKind::Added
        } else {
            ChangeKind::Unchanged
        }
    }

    /// Baseline metrics against working-list metrics.
    #[must_use]
    pub fn performance(&self) -> PerformanceComparison {
        PerformanceComparison::new(self.document.baseline(), &self.document.working, &self.scale)
    }

    /// Whether `code` exists in the reconciled list, including records hidden
    /// by the active filters.
    fn is_known(&self, code: &str) -> bool {
        if position(&self.document.working, code).is_some() {
            return true;
        }
        let log = &self.document.log;
        if log.is_subtracted(code) {
            return false;
        }
        position(self.document.baseline(), code).is_some() || log.is_added(code)
    }
}
