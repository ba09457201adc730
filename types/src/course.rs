use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{Credit, Grade, GradePoint, GradingScale, ValidationError};

/// One course line of a transcript.
///
/// Fields are private so a record can only exist in validated form, and
/// `grade_point` is always the scale's weight for `grade`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CourseRecord {
    #[serde(rename = "course_code")]
    code: String,
    #[serde(rename = "course_name")]
    name: String,
    #[serde(rename = "course_lang")]
    language: String,
    #[serde(rename = "course_credit")]
    credit: Credit,
    #[serde(rename = "course_grade")]
    grade: Grade,
    #[serde(rename = "course_grade_point")]
    grade_point: GradePoint,
}

impl CourseRecord {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        language: impl Into<String>,
        credit: i64,
        grade: &str,
        scale: &GradingScale,
    ) -> Result<Self, ValidationError> {
        CourseDraft {
            code: code.into(),
            name: name.into(),
            language: language.into(),
            credit,
            grade: grade.to_string(),
        }
        .build(scale)
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn credit(&self) -> Credit {
        self.credit
    }

    #[must_use]
    pub fn grade(&self) -> Grade {
        self.grade
    }

    #[must_use]
    pub fn grade_point(&self) -> GradePoint {
        self.grade_point
    }

    /// The value this record holds in `field`, in the form filters compare against.
    #[must_use]
    pub fn value(&self, field: CourseField) -> FieldValue {
        match field {
            CourseField::Code => FieldValue::Text(self.code.clone()),
            CourseField::Name => FieldValue::Text(self.name.clone()),
            CourseField::Language => FieldValue::Text(self.language.clone()),
            CourseField::Credit => FieldValue::Credit(self.credit.value()),
            CourseField::Grade => FieldValue::Grade(self.grade),
            CourseField::GradePoint => FieldValue::GradePoint(self.grade_point),
        }
    }

    /// An editable copy, for building an updated version of this record.
    #[must_use]
    pub fn to_draft(&self) -> CourseDraft {
        CourseDraft {
            code: self.code.clone(),
            name: self.name.clone(),
            language: self.language.clone(),
            credit: i64::from(self.credit.value()),
            grade: self.grade.as_str().to_string(),
        }
    }
}

/// Unvalidated course fields as they arrive from a document or a form.
///
/// `course_grade_point` is accepted on input but ignored: the point is always
/// re-derived from the grade when the draft is built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CourseDraft {
    #[serde(rename = "course_code")]
    pub code: String,
    #[serde(rename = "course_name")]
    pub name: String,
    #[serde(rename = "course_lang")]
    pub language: String,
    #[serde(rename = "course_credit", deserialize_with = "integer_or_numeric_text")]
    pub credit: i64,
    #[serde(rename = "course_grade")]
    pub grade: String,
}

impl CourseDraft {
    pub fn build(self, scale: &GradingScale) -> Result<CourseRecord, ValidationError> {
        let code = self.code.trim().to_string();
        if code.is_empty() {
            return Err(ValidationError::EmptyCode);
        }
        let credit = scale.credit(self.credit)?;
        let grade: Grade = self.grade.parse()?;

        Ok(CourseRecord {
            code,
            name: self.name,
            language: self.language,
            credit,
            grade,
            grade_point: scale.weight(grade),
        })
    }
}

fn integer_or_numeric_text<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Integer(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Columns of a course list that can be filtered and sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CourseField {
    #[serde(rename = "course_code")]
    Code,
    #[serde(rename = "course_name")]
    Name,
    #[serde(rename = "course_lang")]
    Language,
    #[serde(rename = "course_credit")]
    Credit,
    #[serde(rename = "course_grade")]
    Grade,
    #[serde(rename = "course_grade_point")]
    GradePoint,
}

impl CourseField {
    pub const ALL: [CourseField; 6] = [
        CourseField::Code,
        CourseField::Name,
        CourseField::Language,
        CourseField::Credit,
        CourseField::Grade,
        CourseField::GradePoint,
    ];

    /// Fields offered in the filter picker.
    pub const FILTERABLE: [CourseField; 4] = [
        CourseField::Language,
        CourseField::Credit,
        CourseField::Grade,
        CourseField::GradePoint,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CourseField::Code => "course_code",
            CourseField::Name => "course_name",
            CourseField::Language => "course_lang",
            CourseField::Credit => "course_credit",
            CourseField::Grade => "course_grade",
            CourseField::GradePoint => "course_grade_point",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            CourseField::Code => "Course Code",
            CourseField::Name => "Course Name",
            CourseField::Language => "Language",
            CourseField::Credit => "Credit",
            CourseField::Grade => "Grade",
            CourseField::GradePoint => "Grade Point",
        }
    }
}

impl fmt::Display for CourseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseField {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        let short = normalized.strip_prefix("course_").unwrap_or(&normalized);
        match short {
            "code" => Ok(CourseField::Code),
            "name" => Ok(CourseField::Name),
            "lang" | "language" => Ok(CourseField::Language),
            "credit" => Ok(CourseField::Credit),
            "grade" => Ok(CourseField::Grade),
            "grade_point" | "gradepoint" | "point" => Ok(CourseField::GradePoint),
            _ => Err(ValidationError::UnknownField {
                name: raw.to_string(),
            }),
        }
    }
}

/// A typed column value. Values of one field always share a variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Credit(u8),
    Grade(Grade),
    GradePoint(GradePoint),
}

impl FieldValue {
    /// Interprets a JSON value as a value of `field`.
    ///
    /// Numeric columns accept numbers or numeric strings.
    pub fn from_json(field: CourseField, raw: &Value) -> Result<Self, ValidationError> {
        match raw {
            Value::String(text) => Self::parse(field, text),
            Value::Number(number) => match field {
                CourseField::Credit => number
                    .as_u64()
                    .and_then(|value| u8::try_from(value).ok())
                    .map(FieldValue::Credit)
                    .ok_or_else(|| invalid(field, raw)),
                CourseField::GradePoint => number
                    .as_f64()
                    .and_then(GradePoint::from_decimal)
                    .map(FieldValue::GradePoint)
                    .ok_or_else(|| invalid(field, raw)),
                _ => Err(invalid(field, raw)),
            },
            _ => Err(invalid(field, raw)),
        }
    }

    /// Interprets user-entered text as a value of `field`.
    pub fn parse(field: CourseField, text: &str) -> Result<Self, ValidationError> {
        match field {
            CourseField::Code | CourseField::Name | CourseField::Language => {
                Ok(FieldValue::Text(text.to_string()))
            }
            CourseField::Credit => text
                .trim()
                .parse::<u8>()
                .map(FieldValue::Credit)
                .map_err(|_| ValidationError::InvalidFieldValue {
                    field,
                    raw: text.to_string(),
                }),
            CourseField::Grade => text
                .parse::<Grade>()
                .map(FieldValue::Grade)
                .map_err(|_| ValidationError::InvalidFieldValue {
                    field,
                    raw: text.to_string(),
                }),
            CourseField::GradePoint => text
                .parse::<GradePoint>()
                .map(FieldValue::GradePoint)
                .map_err(|_| ValidationError::InvalidFieldValue {
                    field,
                    raw: text.to_string(),
                }),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Credit(credit) => write!(f, "{credit}"),
            FieldValue::Grade(grade) => write!(f, "{grade}"),
            FieldValue::GradePoint(point) => write!(f, "{point}"),
        }
    }
}

fn invalid(field: CourseField, raw: &Value) -> ValidationError {
    ValidationError::InvalidFieldValue {
        field,
        raw: raw.to_string(),
    }
}
