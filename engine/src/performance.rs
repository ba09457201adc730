//! Credit totals and GPA for a course list.

use std::fmt;

use serde::Serialize;
use transcript_types::{CourseRecord, GradingScale};

/// Academic performance of one course list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Performance {
    pub credits_attempted: u32,
    pub credits_successful: u32,
    pub credits_included_in_gpa: u32,
    /// GPA in hundredths, rounded half away from zero.
    #[serde(serialize_with = "gpa_as_decimal")]
    pub gpa_hundredths: u32,
}

impl Performance {
    #[must_use]
    pub fn gpa(&self) -> f64 {
        f64::from(self.gpa_hundredths) / 100.0
    }

    #[must_use]
    pub fn metric(&self, metric: Metric) -> u32 {
        match metric {
            Metric::CreditsAttempted => self.credits_attempted,
            Metric::CreditsSuccessful => self.credits_successful,
            Metric::CreditsIncludedInGpa => self.credits_included_in_gpa,
            Metric::Gpa => self.gpa_hundredths,
        }
    }

    fn format_metric(&self, metric: Metric) -> String {
        match metric {
            Metric::Gpa => format!("{:.2}", self.gpa()),
            other => self.metric(other).to_string(),
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn gpa_as_decimal<S: serde::Serializer>(hundredths: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(f64::from(*hundredths) / 100.0)
}

/// Computes the metrics of `records` under `scale`'s outcome policy.
///
/// GPA is `Σ credit × grade_point / credits_included_in_gpa` over GPA-eligible
/// records, or zero when nothing is eligible.
#[must_use]
pub fn calculate_performance(records: &[CourseRecord], scale: &GradingScale) -> Performance {
    let mut performance = Performance::default();
    let mut weighted_hundredths: u64 = 0;

    for record in records {
        let credit = u32::from(record.credit().value());
        let rule = scale.rule(record.grade());

        performance.credits_attempted += credit;
        if rule.successful {
            performance.credits_successful += credit;
        }
        if rule.gpa_eligible {
            performance.credits_included_in_gpa += credit;
            weighted_hundredths += u64::from(credit) * u64::from(record.grade_point().hundredths());
        }
    }

    if performance.credits_included_in_gpa > 0 {
        let denominator = u64::from(performance.credits_included_in_gpa);
        // Integer half-up rounding; both operands are non-negative.
        let rounded = (2 * weighted_hundredths + denominator) / (2 * denominator);
        performance.gpa_hundredths = u32::try_from(rounded).unwrap_or(u32::MAX);
    }
    performance
}

/// One row of the performance panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    CreditsAttempted,
    CreditsSuccessful,
    CreditsIncludedInGpa,
    Gpa,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::CreditsAttempted,
        Metric::CreditsSuccessful,
        Metric::CreditsIncludedInGpa,
        Metric::Gpa,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Metric::CreditsAttempted => "Credits attempted",
            Metric::CreditsSuccessful => "Credits successful",
            Metric::CreditsIncludedInGpa => "Credits included in GPA",
            Metric::Gpa => "GPA",
        }
    }
}

/// Direction of a metric from the baseline to the working list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increase,
    Decrease,
    Neutral,
}

/// Baseline metrics next to working-list metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PerformanceComparison {
    pub original: Performance,
    pub modified: Performance,
}

impl PerformanceComparison {
    #[must_use]
    pub fn new(original: &[CourseRecord], modified: &[CourseRecord], scale: &GradingScale) -> Self {
        Self {
            original: calculate_performance(original, scale),
            modified: calculate_performance(modified, scale),
        }
    }

    #[must_use]
    pub fn trend(&self, metric: Metric) -> Trend {
        let before = self.original.metric(metric);
        let after = self.modified.metric(metric);
        match after.cmp(&before) {
            std::cmp::Ordering::Greater => Trend::Increase,
            std::cmp::Ordering::Less => Trend::Decrease,
            std::cmp::Ordering::Equal => Trend::Neutral,
        }
    }

    /// Text for one metric under `mode`.
    #[must_use]
    pub fn render(&self, metric: Metric, mode: DisplayMode) -> String {
        match mode {
            DisplayMode::Both => format!(
                "{} ➜ {}",
                self.original.format_metric(metric),
                self.modified.format_metric(metric)
            ),
            DisplayMode::ModifiedOnly => self.modified.format_metric(metric),
        }
    }
}

/// Whether the panel shows `original ➜ modified` or only the modified value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Both,
    ModifiedOnly,
}

impl DisplayMode {
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            DisplayMode::Both => DisplayMode::ModifiedOnly,
            DisplayMode::ModifiedOnly => DisplayMode::Both,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Increase => "increase",
            Trend::Decrease => "decrease",
            Trend::Neutral => "neutral",
        })
    }
}
