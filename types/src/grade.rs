//! Grade notations, grade points, credits and the grading scale.
//!
//! The scale is an explicit value. Nothing in this crate reaches for a global
//! table: record construction, document loading and the performance calculator
//! all take a `&GradingScale`.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::ValidationError;

/// Letter notations a transcript can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Grade {
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    F,
    /// Incomplete.
    I,
    /// Withdrawn.
    W,
    /// Satisfactory (pass-only).
    S,
}

impl Grade {
    pub const ALL: [Grade; 14] = [
        Grade::A,
        Grade::AMinus,
        Grade::BPlus,
        Grade::B,
        Grade::BMinus,
        Grade::CPlus,
        Grade::C,
        Grade::CMinus,
        Grade::DPlus,
        Grade::D,
        Grade::F,
        Grade::I,
        Grade::W,
        Grade::S,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::F => "F",
            Grade::I => "I",
            Grade::W => "W",
            Grade::S => "S",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Notations order by their text, the same way the grade column sorts.
impl Ord for Grade {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for Grade {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Grade {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Grade::ALL
            .into_iter()
            .find(|grade| grade.as_str() == trimmed)
            .ok_or_else(|| ValidationError::UnknownGrade {
                notation: raw.to_string(),
            })
    }
}

impl TryFrom<String> for Grade {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Grade> for String {
    fn from(value: Grade) -> Self {
        value.as_str().to_string()
    }
}

/// A grade point held as exact hundredths (`3.70` is `370`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GradePoint(u16);

impl GradePoint {
    /// Highest weight a scale may assign.
    pub const MAX: GradePoint = GradePoint(400);

    #[must_use]
    pub const fn from_hundredths(hundredths: u16) -> Self {
        Self(hundredths)
    }

    /// Parses a decimal weight such as `3.7`, rounding to hundredths.
    #[must_use]
    pub fn from_decimal(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let hundredths = (value * 100.0).round();
        if hundredths > f64::from(Self::MAX.0) {
            return None;
        }
        Some(Self(hundredths as u16))
    }

    #[must_use]
    pub const fn hundredths(self) -> u16 {
        self.0
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl fmt::Display for GradePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for GradePoint {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .and_then(Self::from_decimal)
            .ok_or_else(|| ValidationError::InvalidGradePoint {
                raw: raw.to_string(),
            })
    }
}

impl Serialize for GradePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

/// A course credit that has been checked against a scale's credit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Credit(u8);

impl Credit {
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Credit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Weight and outcome policy for one notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeRule {
    pub weight: GradePoint,
    /// Credits count as successfully completed.
    pub successful: bool,
    /// Credits count toward the GPA denominator.
    pub gpa_eligible: bool,
}

impl GradeRule {
    #[must_use]
    pub const fn new(hundredths: u16, successful: bool, gpa_eligible: bool) -> Self {
        Self {
            weight: GradePoint::from_hundredths(hundredths),
            successful,
            gpa_eligible,
        }
    }
}

/// Grade→(weight, outcome) table plus the allowed credit set.
///
/// Every notation in [`Grade::ALL`] has exactly one rule. Zero weight does not
/// imply GPA exclusion: `F` weighs nothing but stays in the denominator, while
/// `I`, `W` and `S` are excluded by policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingScale {
    rules: [GradeRule; 14],
    credits: BTreeSet<u8>,
}

impl GradingScale {
    pub const STANDARD_CREDITS: [u8; 7] = [1, 2, 3, 4, 5, 6, 7];

    #[must_use]
    pub fn standard() -> Self {
        Self {
            rules: [
                GradeRule::new(400, true, true),  // A
                GradeRule::new(370, true, true),  // A-
                GradeRule::new(330, true, true),  // B+
                GradeRule::new(300, true, true),  // B
                GradeRule::new(270, true, true),  // B-
                GradeRule::new(230, true, true),  // C+
                GradeRule::new(200, true, true),  // C
                GradeRule::new(170, true, true),  // C-
                GradeRule::new(130, true, true),  // D+
                GradeRule::new(100, true, true),  // D
                GradeRule::new(0, false, true),   // F
                GradeRule::new(0, false, false),  // I
                GradeRule::new(0, false, false),  // W
                GradeRule::new(0, true, false),   // S
            ],
            credits: Self::STANDARD_CREDITS.into_iter().collect(),
        }
    }

    /// Builds a scale from explicit rules. Every notation must be covered.
    pub fn new(
        rules: impl IntoIterator<Item = (Grade, GradeRule)>,
        credits: impl IntoIterator<Item = u8>,
    ) -> Result<Self, ValidationError> {
        let mut slots: [Option<GradeRule>; 14] = [None; 14];
        for (grade, rule) in rules {
            if rule.weight > GradePoint::MAX {
                return Err(ValidationError::InvalidWeight {
                    grade,
                    weight: rule.weight,
                });
            }
            slots[grade.index()] = Some(rule);
        }

        let mut table = [GradeRule::new(0, false, false); 14];
        for grade in Grade::ALL {
            table[grade.index()] =
                slots[grade.index()].ok_or(ValidationError::IncompleteScale { missing: grade })?;
        }

        let credits: BTreeSet<u8> = credits.into_iter().collect();
        if credits.is_empty() || credits.contains(&0) {
            return Err(ValidationError::InvalidCreditSet);
        }

        Ok(Self {
            rules: table,
            credits,
        })
    }

    #[must_use]
    pub fn rule(&self, grade: Grade) -> GradeRule {
        self.rules[grade.index()]
    }

    #[must_use]
    pub fn weight(&self, grade: Grade) -> GradePoint {
        self.rule(grade).weight
    }

    pub fn credit(&self, raw: i64) -> Result<Credit, ValidationError> {
        u8::try_from(raw)
            .ok()
            .filter(|value| self.credits.contains(value))
            .map(Credit)
            .ok_or(ValidationError::CreditOutOfRange { credit: raw })
    }

    pub fn allowed_credits(&self) -> impl Iterator<Item = u8> + '_ {
        self.credits.iter().copied()
    }
}

impl Default for GradingScale {
    fn default() -> Self {
        Self::standard()
    }
}
