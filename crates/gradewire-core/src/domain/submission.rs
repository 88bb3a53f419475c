//! Student identity and submission records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::homework::HomeworkId;
use crate::error::{GradeError, Result};

/// Separator between the student and test-case halves of the composite
/// submission key. Student IDs must never contain it.
pub const KEY_SEPARATOR: char = '_';

/// Validated student identifier.
///
/// Construction rejects IDs containing [`KEY_SEPARATOR`], which is what
/// makes the composite-key boundary match in [`SubmissionRecord`] sound:
/// the first separator in a `student_submission_id` always delimits the
/// full student token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(GradeError::malformed("student_id is empty"));
        }
        if raw.contains(KEY_SEPARATOR) {
            return Err(GradeError::malformed(format!(
                "student_id must not contain '{KEY_SEPARATOR}'"
            )));
        }
        Ok(StudentId(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A graded result: points earned and the ceiling for that test case.
///
/// No schema validation beyond "two numeric values" happens anywhere; the
/// grading function is trusted to return a sensible pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub student_score: f64,
    pub max_score: f64,
}

impl Score {
    pub fn new(student_score: f64, max_score: f64) -> Self {
        Score {
            student_score,
            max_score,
        }
    }

    /// Whether the student earned every available point.
    pub fn is_full(&self) -> bool {
        self.student_score >= self.max_score
    }
}

/// The stored outcome of one grading attempt for one (student, test case)
/// pair within a homework.
///
/// Keyed by `homework_id` + `student_submission_id`; a new submission for
/// the same key unconditionally replaces the old record (last-write-wins,
/// no history).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub homework_id: HomeworkId,

    /// Composite key: `<student_id>_<test_case_id>`.
    pub student_submission_id: String,

    pub student_score: f64,

    pub max_score: f64,

    /// Server-side write time (UTC wall clock).
    pub timestamp: NaiveDateTime,
}

impl SubmissionRecord {
    pub fn new(
        homework_id: HomeworkId,
        student: &StudentId,
        test_case_id: &str,
        score: Score,
        timestamp: NaiveDateTime,
    ) -> Self {
        SubmissionRecord {
            homework_id,
            student_submission_id: format!(
                "{}{}{}",
                student.as_str(),
                KEY_SEPARATOR,
                test_case_id
            ),
            student_score: score.student_score,
            max_score: score.max_score,
            timestamp,
        }
    }

    /// The student half of the composite key (everything before the first
    /// separator).
    pub fn student_id(&self) -> &str {
        self.student_submission_id
            .split(KEY_SEPARATOR)
            .next()
            .unwrap_or(&self.student_submission_id)
    }

    /// The test-case half of the composite key.
    pub fn test_case_id(&self) -> &str {
        match self.student_submission_id.find(KEY_SEPARATOR) {
            Some(idx) => &self.student_submission_id[idx + 1..],
            None => "",
        }
    }

    /// Full-token comparison against a student id. Never a raw string
    /// prefix match: `ali` does not own `alice`'s records.
    pub fn matches_student(&self, student: &StudentId) -> bool {
        self.student_id() == student.as_str()
    }
}
