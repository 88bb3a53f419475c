//! SurrealDB-backed implementation of the gradewire storage traits
//!
//! Uses the row types in `schema` for persistence, converting to/from
//! domain types at the boundary. Upserts are expressed as delete + create
//! under the table's unique key index, which preserves the gradebook's
//! last-write-wins contract.

use async_trait::async_trait;
use chrono::Utc;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use gradewire_core::{
    CourseId, HomeworkId, HomeworkMetadata, Score, StudentId, SubmissionRecord, TestSuite,
};

use crate::error::StorageError;
use crate::migrations;
use crate::schema::{CourseRow, GradebookRow, MetadataRow, SuiteRow};
use crate::storage_traits::{
    CourseDirectory, GradebookStore, MetadataStore, StorageResult, TestSuiteStore,
};

/// SurrealDB-backed store implementing all four persistence traits.
pub struct SurrealGradeStore {
    db: Surreal<Any>,
}

impl SurrealGradeStore {
    /// Create an in-memory instance for testing.
    ///
    /// Connects to `mem://`, selects `gradewire/main`, and runs
    /// `init_schema`.
    pub async fn in_memory() -> StorageResult<Self> {
        Self::connect("mem://").await
    }

    /// Create from environment variables.
    ///
    /// Honors `SURREALDB_URL`; otherwise falls back to local persistence
    /// under `.gradewire/db`.
    pub async fn from_env() -> StorageResult<Self> {
        if let Ok(url) = std::env::var("SURREALDB_URL") {
            let store = Self::connect(&url).await?;
            info!("SurrealGradeStore connected ({})", url);
            return Ok(store);
        }

        let path = ".gradewire/db";
        std::fs::create_dir_all(path).map_err(|e| {
            StorageError::Connection(format!("Failed to create database directory {path}: {e}"))
        })?;
        let url = format!("surrealkv://{path}");
        info!(
            "No SURREALDB_URL found, using local persistence: {}",
            url
        );
        Self::connect(&url).await
    }

    async fn connect(url: &str) -> StorageResult<Self> {
        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        db.use_ns("gradewire")
            .use_db("main")
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;
        Ok(Self { db })
    }

    // -- private helpers -----------------------------------------------------

    /// Full-replace write: delete any row matching the key, then create.
    async fn replace_by_homework<R>(
        &self,
        table: &str,
        homework_id: &str,
        row: R,
    ) -> StorageResult<()>
    where
        R: serde::Serialize + Send + 'static,
    {
        let hid = homework_id.to_string();
        self.db
            .query(format!("DELETE {table} WHERE homework_id = $hid"))
            .bind(("hid", hid))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let _created: Option<serde_json::Value> = self
            .db
            .create(table)
            .content(row)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl MetadataStore for SurrealGradeStore {
    async fn put_metadata(&self, metadata: HomeworkMetadata) -> StorageResult<()> {
        debug!(homework_id = %metadata.homework_id, "writing homework metadata");
        let row = MetadataRow::from_metadata(&metadata);
        self.replace_by_homework("homework_metadata", metadata.homework_id.as_str(), row)
            .await
    }

    async fn get_metadata(&self, homework_id: &HomeworkId) -> StorageResult<HomeworkMetadata> {
        let hid = homework_id.as_str().to_string();
        let mut res = self
            .db
            .query("SELECT * FROM homework_metadata WHERE homework_id = $hid")
            .bind(("hid", hid))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<MetadataRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::MetadataNotFound {
                homework_id: homework_id.as_str().to_string(),
            })?
            .into_metadata()
    }
}

#[async_trait]
impl TestSuiteStore for SurrealGradeStore {
    async fn put_suite(&self, homework_id: &HomeworkId, suite: TestSuite) -> StorageResult<()> {
        debug!(homework_id = %homework_id, digest = %suite.short_digest(), "writing test suite");
        let row = SuiteRow::from_suite(homework_id, &suite)?;
        self.replace_by_homework("test_suites", homework_id.as_str(), row)
            .await
    }

    async fn get_suite(&self, homework_id: &HomeworkId) -> StorageResult<TestSuite> {
        let hid = homework_id.as_str().to_string();
        let mut res = self
            .db
            .query("SELECT * FROM test_suites WHERE homework_id = $hid")
            .bind(("hid", hid))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<SuiteRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::SuiteNotFound {
                homework_id: homework_id.as_str().to_string(),
            })?
            .into_suite()
    }
}

#[async_trait]
impl GradebookStore for SurrealGradeStore {
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
        let row = GradebookRow::from_record(&record);

        debug!(
            homework_id = %homework_id,
            submission = %record.student_submission_id,
            "upserting submission record"
        );

        let hid = homework_id.as_str().to_string();
        let sid = record.student_submission_id.clone();
        self.db
            .query("DELETE gradebook WHERE homework_id = $hid AND student_submission_id = $sid")
            .bind(("hid", hid))
            .bind(("sid", sid))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let _created: Option<GradebookRow> = self
            .db
            .create("gradebook")
            .content(row)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(record)
    }

    async fn scan(
        &self,
        homework_id: &HomeworkId,
        student: Option<&StudentId>,
    ) -> StorageResult<Vec<SubmissionRecord>> {
        let hid = homework_id.as_str().to_string();
        let mut res = self
            .db
            .query("SELECT * FROM gradebook WHERE homework_id = $hid ORDER BY student_submission_id ASC")
            .bind(("hid", hid))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<GradebookRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let records: Vec<SubmissionRecord> = rows
            .into_iter()
            .map(GradebookRow::into_record)
            .collect::<StorageResult<_>>()?;

        // Student narrowing happens on the full token, never a raw prefix;
        // keep it app-side so the boundary rule lives in exactly one place.
        Ok(records
            .into_iter()
            .filter(|r| student.map(|s| r.matches_student(s)).unwrap_or(true))
            .collect())
    }
}

#[async_trait]
impl CourseDirectory for SurrealGradeStore {
    async fn course_for_key(&self, secret_key: &str) -> StorageResult<CourseId> {
        let key = secret_key.to_string();
        let mut res = self
            .db
            .query("SELECT * FROM courses WHERE secret_key = $key")
            .bind(("key", key))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<CourseRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        rows.into_iter()
            .next()
            .map(|row| CourseId(row.course_id))
            .ok_or(StorageError::UnknownSecretKey)
    }

    async fn add_course(&self, secret_key: &str, course_id: &CourseId) -> StorageResult<()> {
        debug!(course_id = %course_id, "registering course");
        let key = secret_key.to_string();
        self.db
            .query("DELETE courses WHERE secret_key = $key")
            .bind(("key", key))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let _created: Option<CourseRow> = self
            .db
            .create("courses")
            .content(CourseRow::new(secret_key, course_id))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(())
    }
}
