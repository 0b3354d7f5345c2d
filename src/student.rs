use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Averages at or above this mark count as a pass.
pub const PASS_THRESHOLD: f64 = 75.0;
pub const MAX_SCORE: f64 = 100.0;

/// Field-level validation failure. `field` names the offending input so a
/// front end can point at the exact form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeStatus {
    Pass,
    Fail,
}

impl GradeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GradeStatus::Pass => "pass",
            GradeStatus::Fail => "fail",
        }
    }
}

/// A single student record: identity, class label, and subject marks.
///
/// Fields are private; every way in (constructor, setters, grade insertion,
/// deserialization) runs the same validation, so an observable `Student`
/// always holds trimmed non-blank strings and scores within [0, 100].
/// Subjects are kept in a sorted map, which makes serialized output and
/// report rows deterministic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Student {
    id: String,
    name: String,
    #[serde(rename = "class")]
    class_name: String,
    grades: BTreeMap<String, f64>,
}

fn non_blank(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(
            field,
            format!("{} must not be blank", field),
        ));
    }
    Ok(trimmed.to_string())
}

fn check_score(score: f64) -> Result<(), ValidationError> {
    if !score.is_finite() || !(0.0..=MAX_SCORE).contains(&score) {
        return Err(ValidationError::new(
            "score",
            format!("score must be a number between 0 and 100, got {}", score),
        ));
    }
    Ok(())
}

impl Student {
    pub fn new(id: &str, name: &str, class_name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id: non_blank("id", id)?,
            name: non_blank("name", name)?,
            class_name: non_blank("class", class_name)?,
            grades: BTreeMap::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn grades(&self) -> &BTreeMap<String, f64> {
        &self.grades
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), ValidationError> {
        self.name = non_blank("name", name)?;
        Ok(())
    }

    pub fn set_class(&mut self, class_name: &str) -> Result<(), ValidationError> {
        self.class_name = non_blank("class", class_name)?;
        Ok(())
    }

    /// Inserts or overwrites one subject mark. On a validation failure the
    /// existing grades are untouched.
    pub fn add_grade(&mut self, subject: &str, score: f64) -> Result<(), ValidationError> {
        let subject = non_blank("subject", subject)?;
        check_score(score)?;
        self.grades.insert(subject, score);
        Ok(())
    }

    /// Replaces the whole grade map. The replacement set is validated in full
    /// before the swap, so a bad entry cannot leave the student with
    /// partially cleared grades.
    pub fn replace_grades(&mut self, grades: &BTreeMap<String, f64>) -> Result<(), ValidationError> {
        let mut next = BTreeMap::new();
        for (subject, score) in grades {
            let subject = non_blank("subject", subject)?;
            check_score(*score)?;
            next.insert(subject, *score);
        }
        self.grades = next;
        Ok(())
    }

    /// Arithmetic mean of all subject marks; 0 with no grades recorded.
    pub fn average(&self) -> f64 {
        if self.grades.is_empty() {
            return 0.0;
        }
        let total: f64 = self.grades.values().sum();
        total / self.grades.len() as f64
    }

    pub fn status(&self) -> GradeStatus {
        if self.average() >= PASS_THRESHOLD {
            GradeStatus::Pass
        } else {
            GradeStatus::Fail
        }
    }
}

/// Wire/file shape. Deserialization goes through this and then re-runs the
/// constructor and per-grade validation, so a hand-edited store file with an
/// out-of-range mark is rejected rather than trusted.
#[derive(Deserialize)]
struct RawStudent {
    id: String,
    name: String,
    #[serde(rename = "class")]
    class_name: String,
    #[serde(default)]
    grades: BTreeMap<String, f64>,
}

impl TryFrom<RawStudent> for Student {
    type Error = ValidationError;

    fn try_from(raw: RawStudent) -> Result<Self, Self::Error> {
        let mut student = Student::new(&raw.id, &raw.name, &raw.class_name)?;
        for (subject, score) in &raw.grades {
            student.add_grade(subject, *score)?;
        }
        Ok(student)
    }
}

impl<'de> Deserialize<'de> for Student {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawStudent::deserialize(deserializer)?;
        Student::try_from(raw).map_err(D::Error::custom)
    }
}
