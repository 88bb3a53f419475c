//! Storage trait definitions for gradewire
//!
//! These traits define the core persistence abstractions:
//! - `MetadataStore`: homework metadata (full-replace upserts)
//! - `TestSuiteStore`: test suites (full-replace upserts)
//! - `GradebookStore`: submission records (last-write-wins upsert + scans)
//! - `CourseDirectory`: secret key -> course resolution
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;

use gradewire_core::{CourseId, HomeworkId, HomeworkMetadata, Score, StudentId, SubmissionRecord, TestSuite};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// MetadataStore — Homework Metadata
// ---------------------------------------------------------------------------

/// Homework metadata persistence.
///
/// Guarantees:
/// - `put_metadata` is a full replace for the homework's row.
/// - Metadata is never deleted.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Create or overwrite the metadata for a homework.
    async fn put_metadata(&self, metadata: HomeworkMetadata) -> StorageResult<()>;

    /// Fetch the metadata for a homework. `MetadataNotFound` if absent.
    async fn get_metadata(&self, homework_id: &HomeworkId) -> StorageResult<HomeworkMetadata>;
}

// ---------------------------------------------------------------------------
// TestSuiteStore — Test Suites
// ---------------------------------------------------------------------------

/// Test suite persistence.
///
/// Guarantees:
/// - `put_suite` atomically replaces the whole stored suite; there is no
///   merge with a prior version.
#[async_trait]
pub trait TestSuiteStore: Send + Sync {
    /// Replace the stored suite for a homework.
    async fn put_suite(&self, homework_id: &HomeworkId, suite: TestSuite) -> StorageResult<()>;

    /// Fetch the stored suite. `SuiteNotFound` if the homework has none.
    async fn get_suite(&self, homework_id: &HomeworkId) -> StorageResult<TestSuite>;
}

// ---------------------------------------------------------------------------
// GradebookStore — Submission Records
// ---------------------------------------------------------------------------

/// Submission record persistence.
///
/// Guarantees:
/// - `upsert` writes under `(homework_id, <student>_<test_case>)` with a
///   fresh server timestamp, unconditionally replacing any prior record
///   (last-write-wins; no score ratcheting).
/// - `scan` with a student filter matches the student token exactly, never
///   a raw string prefix.
#[async_trait]
pub trait GradebookStore: Send + Sync {
    /// Record a graded submission, returning the written record.
    async fn upsert(
        &self,
        homework_id: &HomeworkId,
        student: &StudentId,
        test_case_id: &str,
        score: Score,
    ) -> StorageResult<SubmissionRecord>;

    /// Every record for the homework, optionally narrowed to one student.
    async fn scan(
        &self,
        homework_id: &HomeworkId,
        student: Option<&StudentId>,
    ) -> StorageResult<Vec<SubmissionRecord>>;
}

// ---------------------------------------------------------------------------
// CourseDirectory — Secret Key Resolution
// ---------------------------------------------------------------------------

/// Course bootstrap data: one secret key per course.
#[async_trait]
pub trait CourseDirectory: Send + Sync {
    /// Resolve a secret key to its course. `UnknownSecretKey` if invalid.
    async fn course_for_key(&self, secret_key: &str) -> StorageResult<CourseId>;

    /// Register a new (secret key, course) pair.
    async fn add_course(&self, secret_key: &str, course_id: &CourseId) -> StorageResult<()>;
}
