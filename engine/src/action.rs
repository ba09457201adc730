//! UI-level actions dispatched onto the reconciler.

use transcript_types::{CourseField, CourseRecord, FilterSpec, SortSpec};

use crate::reconcile::{ReconcileError, Reconciler};

/// One user action. `None` selections stand for a dismissed picker or dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    Add(Option<CourseRecord>),
    Remove(Option<String>),
    Update(Option<CourseRecord>),
    SetFilters(Vec<FilterSpec>),
    PushFilter(FilterSpec),
    ClearFilters,
    Sort(SortSpec),
    SortColumn(CourseField),
    Rebuild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    /// The action was valid but left the session as it was.
    Unchanged,
    /// Nothing was selected; the user backed out.
    Cancelled,
}

impl Reconciler {
    pub fn apply(&mut self, action: SessionAction) -> Result<ActionOutcome, ReconcileError> {
        match action {
            SessionAction::Add(None)
            | SessionAction::Remove(None)
            | SessionAction::Update(None) => {
                tracing::debug!("Action cancelled without a selection");
                return Ok(ActionOutcome::Cancelled);
            }
            SessionAction::Add(Some(record)) => {
                self.add(record)?;
            }
            SessionAction::Remove(Some(code)) => {
                self.remove(&code)?;
            }
            SessionAction::Update(Some(record)) => {
                if !self.apply_update(record)? {
                    return Ok(ActionOutcome::Unchanged);
                }
            }
            SessionAction::SetFilters(filters) => {
                self.set_filters(filters);
            }
            SessionAction::PushFilter(filter) => {
                self.push_filter(filter);
            }
            SessionAction::ClearFilters => {
                self.clear_filters();
            }
            SessionAction::Sort(spec) => {
                self.set_sort(spec);
            }
            SessionAction::SortColumn(field) => {
                self.sort_column(field);
            }
            SessionAction::Rebuild => {
                self.rebuild();
            }
        }
        Ok(ActionOutcome::Applied)
    }
}
