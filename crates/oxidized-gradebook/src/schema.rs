//! Schema definitions for gradewire SurrealDB tables
//!
//! Tables:
//! - homework_metadata: deadline and score policy per homework
//! - test_suites: codec-encoded suite blob per homework
//! - gradebook: one row per (homework, student, test case)
//! - courses: secret key -> course id
//!
//! Timestamps are stored as formatted strings so rows stay readable in the
//! database console and portable across backends.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use gradewire_core::{codec, CourseId, HomeworkId, HomeworkMetadata, SubmissionRecord, TestSuite};

use crate::error::StorageError;
use crate::storage_traits::StorageResult;

/// Wire format for timestamp columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_ts(raw: &str) -> StorageResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| StorageError::Serialization(format!("bad timestamp '{raw}': {e}")))
}

// ---------------------------------------------------------------------------
// homework_metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataRow {
    pub homework_id: String,
    pub deadline: String,
    pub max_daily_submissions: i64,
    pub total_score: f64,
}

impl MetadataRow {
    pub fn from_metadata(metadata: &HomeworkMetadata) -> Self {
        MetadataRow {
            homework_id: metadata.homework_id.as_str().to_string(),
            deadline: format_ts(metadata.deadline),
            max_daily_submissions: metadata.max_daily_submissions,
            total_score: metadata.total_score,
        }
    }

    pub fn into_metadata(self) -> StorageResult<HomeworkMetadata> {
        Ok(HomeworkMetadata {
            homework_id: HomeworkId::parse(self.homework_id)
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
            deadline: parse_ts(&self.deadline)?,
            max_daily_submissions: self.max_daily_submissions,
            total_score: self.total_score,
        })
    }
}

// ---------------------------------------------------------------------------
// test_suites
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteRow {
    pub homework_id: String,
    /// Codec-encoded [`TestSuite`]; the store treats it as opaque.
    pub suite: String,
    /// Denormalized digest for quick version checks.
    pub digest: String,
}

impl SuiteRow {
    pub fn from_suite(homework_id: &HomeworkId, suite: &TestSuite) -> StorageResult<Self> {
        Ok(SuiteRow {
            homework_id: homework_id.as_str().to_string(),
            suite: codec::serialize(suite)
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
            digest: suite.digest.clone(),
        })
    }

    pub fn into_suite(self) -> StorageResult<TestSuite> {
        codec::deserialize(&self.suite).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// gradebook
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradebookRow {
    pub homework_id: String,
    pub student_submission_id: String,
    pub student_score: f64,
    pub max_score: f64,
    pub timestamp: String,
}

impl GradebookRow {
    pub fn from_record(record: &SubmissionRecord) -> Self {
        GradebookRow {
            homework_id: record.homework_id.as_str().to_string(),
            student_submission_id: record.student_submission_id.clone(),
            student_score: record.student_score,
            max_score: record.max_score,
            timestamp: format_ts(record.timestamp),
        }
    }

    pub fn into_record(self) -> StorageResult<SubmissionRecord> {
        Ok(SubmissionRecord {
            homework_id: HomeworkId::parse(self.homework_id)
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
            student_submission_id: self.student_submission_id,
            student_score: self.student_score,
            max_score: self.max_score,
            timestamp: parse_ts(&self.timestamp)?,
        })
    }
}

// ---------------------------------------------------------------------------
// courses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRow {
    pub secret_key: String,
    pub course_id: String,
}

impl CourseRow {
    pub fn new(secret_key: &str, course_id: &CourseId) -> Self {
        CourseRow {
            secret_key: secret_key.to_string(),
            course_id: course_id.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gradewire_core::{LibraryManifest, Score, StudentId};
    use std::collections::BTreeMap;

    #[test]
    fn test_timestamp_round_trip() {
        let ts = NaiveDate::from_ymd_opt(2024, 9, 21)
            .unwrap()
            .and_hms_opt(23, 59, 30)
            .unwrap();
        assert_eq!(parse_ts(&format_ts(ts)).unwrap(), ts);
    }

    #[test]
    fn test_gradebook_row_round_trip() {
        let homework_id =
            HomeworkId::derive(&CourseId("CIS545_F24".to_string()), 1);
        let student = StudentId::new("alice").unwrap();
        let ts = NaiveDate::from_ymd_opt(2024, 9, 20)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let record = SubmissionRecord::new(homework_id, &student, "q1", Score::new(10.0, 10.0), ts);

        let row = GradebookRow::from_record(&record);
        assert_eq!(row.into_record().unwrap(), record);
    }

    #[test]
    fn test_suite_row_round_trip() {
        let homework_id =
            HomeworkId::derive(&CourseId("CIS545_F24".to_string()), 1);
        let suite = TestSuite::new(BTreeMap::new(), LibraryManifest::new());

        let row = SuiteRow::from_suite(&homework_id, &suite).unwrap();
        assert_eq!(row.digest, suite.digest);
        assert_eq!(row.into_suite().unwrap(), suite);
    }
}
