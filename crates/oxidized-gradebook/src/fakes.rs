//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryMetadataStore`, `MemoryTestSuiteStore`,
//! `MemoryGradebook`, and `MemoryCourseDirectory` that satisfy the trait
//! contracts without any external dependencies.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use gradewire_core::{
    CourseId, HomeworkId, HomeworkMetadata, Score, StudentId, SubmissionRecord, TestSuite,
};

use crate::error::StorageError;
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryMetadataStore
// ---------------------------------------------------------------------------

/// In-memory metadata store backed by a `HashMap<homework_id, metadata>`.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    rows: Mutex<HashMap<String, HomeworkMetadata>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn put_metadata(&self, metadata: HomeworkMetadata) -> StorageResult<()> {
        let mut rows = self.rows.lock().unwrap();
        rows.insert(metadata.homework_id.as_str().to_string(), metadata);
        Ok(())
    }

    async fn get_metadata(&self, homework_id: &HomeworkId) -> StorageResult<HomeworkMetadata> {
        let rows = self.rows.lock().unwrap();
        rows.get(homework_id.as_str())
            .cloned()
            .ok_or_else(|| StorageError::MetadataNotFound {
                homework_id: homework_id.as_str().to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// MemoryTestSuiteStore
// ---------------------------------------------------------------------------

/// In-memory suite store backed by a `HashMap<homework_id, suite>`.
#[derive(Debug, Default)]
pub struct MemoryTestSuiteStore {
    rows: Mutex<HashMap<String, TestSuite>>,
}

impl MemoryTestSuiteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TestSuiteStore for MemoryTestSuiteStore {
    async fn put_suite(&self, homework_id: &HomeworkId, suite: TestSuite) -> StorageResult<()> {
        let mut rows = self.rows.lock().unwrap();
        rows.insert(homework_id.as_str().to_string(), suite);
        Ok(())
    }

    async fn get_suite(&self, homework_id: &HomeworkId) -> StorageResult<TestSuite> {
        let rows = self.rows.lock().unwrap();
        rows.get(homework_id.as_str())
            .cloned()
            .ok_or_else(|| StorageError::SuiteNotFound {
                homework_id: homework_id.as_str().to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// MemoryGradebook
// ---------------------------------------------------------------------------

/// In-memory gradebook keyed by `(homework_id, student_submission_id)`.
#[derive(Debug, Default)]
pub struct MemoryGradebook {
    rows: Mutex<HashMap<(String, String), SubmissionRecord>>,
}

impl MemoryGradebook {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GradebookStore for MemoryGradebook {
    async fn upsert(
        &self,
        homework_id: &HomeworkId,
        student: &StudentId,
        test_case_id: &str,
        score: Score,
    ) -> StorageResult<SubmissionRecord> {
        let record = SubmissionRecord::new(
            homework_id.clone(),
            student,
            test_case_id,
            score,
            Utc::now().naive_utc(),
        );
        let mut rows = self.rows.lock().unwrap();
        rows.insert(
            (
                homework_id.as_str().to_string(),
                record.student_submission_id.clone(),
            ),
            record.clone(),
        );
        Ok(record)
    }

    async fn scan(
        &self,
        homework_id: &HomeworkId,
        student: Option<&StudentId>,
    ) -> StorageResult<Vec<SubmissionRecord>> {
        let rows = self.rows.lock().unwrap();
        let mut records: Vec<SubmissionRecord> = rows
            .values()
            .filter(|r| r.homework_id == *homework_id)
            .filter(|r| student.map(|s| r.matches_student(s)).unwrap_or(true))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.student_submission_id.cmp(&b.student_submission_id));
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// MemoryCourseDirectory
// ---------------------------------------------------------------------------

/// In-memory course directory backed by a `HashMap<secret_key, course_id>`.
#[derive(Debug, Default)]
pub struct MemoryCourseDirectory {
    rows: Mutex<HashMap<String, CourseId>>,
}

impl MemoryCourseDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a course during test setup.
    pub fn with_course(self, secret_key: &str, course_id: &str) -> Self {
        self.rows
            .lock()
            .unwrap()
            .insert(secret_key.to_string(), CourseId(course_id.to_string()));
        self
    }
}

#[async_trait]
impl CourseDirectory for MemoryCourseDirectory {
    async fn course_for_key(&self, secret_key: &str) -> StorageResult<CourseId> {
        let rows = self.rows.lock().unwrap();
        rows.get(secret_key)
            .cloned()
            .ok_or(StorageError::UnknownSecretKey)
    }

    async fn add_course(&self, secret_key: &str, course_id: &CourseId) -> StorageResult<()> {
        let mut rows = self.rows.lock().unwrap();
        rows.insert(secret_key.to_string(), course_id.clone());
        Ok(())
    }
}
