//! Homework identity and metadata.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Course identifier resolved from a secret key (e.g. `CIS545_F24`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub String);

impl CourseId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CourseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Globally unique homework identifier in the form `<course_id>_HW<n>`.
///
/// Constructed only through [`HomeworkId::derive`], so the format invariant
/// holds everywhere a `HomeworkId` appears.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HomeworkId(String);

impl HomeworkId {
    /// Derive the homework id from a course and its assignment number.
    ///
    /// Pure and deterministic: `CIS545_F24` + 1 -> `CIS545_F24_HW1`.
    pub fn derive(course_id: &CourseId, homework_number: u32) -> Self {
        HomeworkId(format!("{}_HW{}", course_id.0, homework_number))
    }

    /// Accept an id that was already derived elsewhere (e.g. carried by a
    /// student request). No format check beyond non-emptiness: the id is
    /// the student-side capability token, so an unknown id simply fails
    /// lookup later.
    pub fn parse(raw: impl Into<String>) -> crate::Result<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(crate::GradeError::malformed("homework_id is empty"));
        }
        Ok(HomeworkId(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HomeworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-homework metadata, written wholesale by instructor updates.
///
/// `max_daily_submissions` is stored and echoed back to clients but not
/// enforced by any component; enforcement is an open product decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeworkMetadata {
    pub homework_id: HomeworkId,

    /// Instructor-supplied deadline, wall-clock in the course's timezone.
    pub deadline: NaiveDateTime,

    pub max_daily_submissions: i64,

    /// Total points the homework is worth.
    pub total_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homework_id_derivation() {
        let course = CourseId("CIS545_F24".to_string());
        let id = HomeworkId::derive(&course, 1);
        assert_eq!(id.as_str(), "CIS545_F24_HW1");
    }

    #[test]
    fn test_homework_id_derivation_is_deterministic() {
        let course = CourseId("CIS545_F24".to_string());
        assert_eq!(
            HomeworkId::derive(&course, 3),
            HomeworkId::derive(&course, 3)
        );
    }

    #[test]
    fn test_empty_homework_id_rejected() {
        assert!(HomeworkId::parse("").is_err());
    }
}
