//! Plain-text views of a session for stdout.

use std::collections::BTreeMap;
use std::fmt::Write;

use transcript_engine::{
    ChangeKind, CourseField, CourseRecord, DisplayMode, FieldValue, FilterSpec, Metric,
    PerformanceComparison, Reconciler, Trend,
};

const COLUMNS: [CourseField; 6] = CourseField::ALL;

fn marker(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Added => "+",
        ChangeKind::Updated => "~",
        ChangeKind::Unchanged => " ",
    }
}

fn trend_marker(trend: Trend) -> &'static str {
    match trend {
        Trend::Increase => "▲",
        Trend::Decrease => "▼",
        Trend::Neutral => " ",
    }
}

fn cell(record: &CourseRecord, field: CourseField) -> String {
    record.value(field).to_string()
}

/// The working list as an aligned table. Rows added this session are marked
/// `+`, edited rows `~`.
pub fn course_table(engine: &Reconciler) -> String {
    let records = engine.working();
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| COLUMNS.iter().map(|&field| cell(record, field)).collect())
        .collect();

    let mut widths: Vec<usize> = COLUMNS.iter().map(|field| field.label().chars().count()).collect();
    for row in &rows {
        for (width, text) in widths.iter_mut().zip(row) {
            *width = (*width).max(text.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<&str> = COLUMNS.iter().map(|field| field.label()).collect();
    push_row(&mut out, " ", &header, &widths);
    for (record, row) in records.iter().zip(&rows) {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        push_row(&mut out, marker(engine.change_kind(record.code())), &cells, &widths);
    }
    if records.is_empty() {
        out.push_str("  (no courses)\n");
    }
    out
}

fn push_row(out: &mut String, marker: &str, cells: &[&str], widths: &[usize]) {
    out.push_str(marker);
    for (text, &width) in cells.iter().zip(widths) {
        let _ = write!(out, " {text:<width$}");
    }
    let trimmed = out.trim_end_matches(' ').len();
    out.truncate(trimmed);
    out.push('\n');
}

/// Baseline against working metrics, one line per metric.
pub fn performance_panel(comparison: &PerformanceComparison, mode: DisplayMode) -> String {
    let label_width = Metric::ALL
        .iter()
        .map(|metric| metric.label().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for metric in Metric::ALL {
        let _ = writeln!(
            out,
            "{:<label_width$}  {} {}",
            metric.label(),
            trend_marker(comparison.trend(metric)),
            comparison.render(metric, mode)
        );
    }
    out
}

/// Values a filter could pick from, with the active filters listed first.
pub fn filter_values(
    values: &BTreeMap<CourseField, Vec<FieldValue>>,
    active: &[FilterSpec],
) -> String {
    let mut out = String::new();
    if active.is_empty() {
        out.push_str("Active filters: none\n");
    } else {
        out.push_str("Active filters:\n");
        for spec in active {
            let allowed: Vec<String> = spec.allowed().iter().map(ToString::to_string).collect();
            let _ = writeln!(out, "  {} in [{}]", spec.field(), allowed.join(", "));
        }
    }

    out.push_str("Available values:\n");
    for (field, field_values) in values {
        let shown: Vec<String> = field_values.iter().map(ToString::to_string).collect();
        let _ = writeln!(out, "  {}: {}", field, shown.join(", "));
    }
    out
}
