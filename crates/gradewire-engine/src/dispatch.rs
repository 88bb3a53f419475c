//! Request dispatch and authorization.
//!
//! The thin layer between the transport (whatever it is) and the core:
//! decodes an inbound request object, authorizes instructor-scoped
//! operations against the course directory, routes to the right component,
//! and folds every outcome into a `{status_code, body, headers}` response.
//!
//! Student-scoped operations (submitting, reading one's own grades) are
//! deliberately not key-gated: knowing the homework id and asserting a
//! student id is the trust boundary. Instructor-scoped operations require
//! a valid course secret key.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use gradewire_core::{
    codec, summarize, summarize_student, CourseId, GradeError, GraderRef, HomeworkId,
    HomeworkMetadata, LibraryManifest, Result, StudentId, StudentSummary, SubmissionRecord,
    TestSuite,
};
use oxidized_gradebook::{
    CourseDirectory, GradebookStore, MetadataStore, StorageError, TestSuiteStore,
};

use crate::pipeline::GradingPipeline;
use crate::registry::ModuleRegistry;
use crate::resolver::{resolve_manifest, Bindings};

/// Status code for a handled request.
pub const SUCCESS: u16 = 200;
/// Status code for any request-level failure.
pub const ERROR: u16 = 400;

// ---------------------------------------------------------------------------
// Request / response envelope
// ---------------------------------------------------------------------------

/// Inbound request object, discriminated by `request_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "request_type")]
pub enum ApiRequest {
    /// Resolve (secret key, homework number) to the homework id.
    #[serde(rename = "GET_HOMEWORK_ID")]
    GetHomeworkId {
        homework_number: u32,
        secret_key: String,
    },

    /// Create or overwrite a homework's metadata.
    #[serde(rename = "UPDATE_METADATA")]
    UpdateMetadata {
        homework_number: u32,
        secret_key: String,
        /// Codec-encoded [`MetadataPayload`].
        payload: String,
    },

    /// Replace a homework's test suite wholesale.
    #[serde(rename = "UPDATE_TESTS")]
    UpdateTests {
        homework_number: u32,
        secret_key: String,
        /// Codec-encoded [`SuitePayload`].
        payload: String,
    },

    /// Register a new course key, gated on an existing valid key.
    #[serde(rename = "ADD_NEW_COURSE")]
    AddCourse {
        secret_key: String,
        /// Codec-encoded [`NewCoursePayload`].
        payload: String,
    },

    /// Grade one submission.
    #[serde(rename = "SUBMIT")]
    Submit {
        homework_id: String,
        student_id: String,
        test_case_id: String,
        /// Codec-encoded answer value.
        answer: String,
    },

    /// One student's records and rollup for a homework.
    #[serde(rename = "STUDENT_GRADE")]
    StudentGrade {
        homework_id: String,
        student_id: String,
    },

    /// Every student's records and rollups for a homework.
    #[serde(rename = "ALL_STUDENTS_GRADES")]
    AllStudentsGrades {
        homework_id: String,
        secret_key: String,
    },
}

/// Outbound response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: String,
    pub headers: BTreeMap<String, String>,
}

impl ApiResponse {
    fn headers() -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    pub fn ok(body: String) -> Self {
        ApiResponse {
            status_code: SUCCESS,
            body,
            headers: Self::headers(),
        }
    }

    pub fn error(err: &GradeError) -> Self {
        ApiResponse {
            status_code: ERROR,
            body: err.to_string(),
            headers: Self::headers(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == SUCCESS
    }
}

// ---------------------------------------------------------------------------
// Payloads and reports
// ---------------------------------------------------------------------------

/// Instructor payload for UPDATE_METADATA.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataPayload {
    pub deadline: NaiveDateTime,
    pub total_score: f64,
    pub max_daily_submissions: i64,
}

/// Instructor payload for UPDATE_TESTS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuitePayload {
    pub test_cases: BTreeMap<String, GraderRef>,
    pub libraries: LibraryManifest,
}

/// Instructor payload for ADD_NEW_COURSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCoursePayload {
    pub course_id: String,
    pub secret_key: String,
}

/// Response body for STUDENT_GRADE, codec-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentGradeReport {
    pub records: Vec<SubmissionRecord>,
    pub summary: Option<StudentSummary>,
    pub deadline: NaiveDateTime,
    pub max_daily_submissions: i64,
    pub total_score: f64,
}

/// Response body for ALL_STUDENTS_GRADES, codec-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseGradeReport {
    pub records: Vec<SubmissionRecord>,
    pub summaries: Vec<StudentSummary>,
    pub deadline: NaiveDateTime,
}

// ---------------------------------------------------------------------------
// GraderService
// ---------------------------------------------------------------------------

/// The assembled grading service: storage handles, function registry, and
/// the grading pipeline, behind one dispatch entry point.
pub struct GraderService {
    metadata: Arc<dyn MetadataStore>,
    suites: Arc<dyn TestSuiteStore>,
    gradebook: Arc<dyn GradebookStore>,
    courses: Arc<dyn CourseDirectory>,
    registry: Arc<ModuleRegistry>,
    pipeline: GradingPipeline,
}

impl GraderService {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        suites: Arc<dyn TestSuiteStore>,
        gradebook: Arc<dyn GradebookStore>,
        courses: Arc<dyn CourseDirectory>,
        registry: Arc<ModuleRegistry>,
    ) -> Self {
        let pipeline = GradingPipeline::new(registry.clone(), suites.clone(), gradebook.clone());
        GraderService {
            metadata,
            suites,
            gradebook,
            courses,
            registry,
            pipeline,
        }
    }

    /// Decode a raw request body and dispatch it. Undecodable bodies fail
    /// as `MalformedPayload` before any core logic runs.
    pub async fn dispatch_raw(&self, body: &str) -> ApiResponse {
        match serde_json::from_str::<ApiRequest>(body) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                warn!(error = %e, "undecodable request body");
                ApiResponse::error(&GradeError::malformed(e.to_string()))
            }
        }
    }

    /// Route a decoded request and fold the outcome into a response.
    ///
    /// Every error is terminal for the request and maps to a 400 with the
    /// error's message as the body; nothing propagates out of here.
    pub async fn dispatch(&self, request: ApiRequest) -> ApiResponse {
        match self.handle(request).await {
            Ok(body) => ApiResponse::ok(body),
            Err(err) => {
                warn!(error = %err, "request failed");
                ApiResponse::error(&err)
            }
        }
    }

    async fn handle(&self, request: ApiRequest) -> Result<String> {
        match request {
            ApiRequest::GetHomeworkId {
                homework_number,
                secret_key,
            } => {
                let course = self.authorize(&secret_key).await?;
                Ok(HomeworkId::derive(&course, homework_number).to_string())
            }

            ApiRequest::UpdateMetadata {
                homework_number,
                secret_key,
                payload,
            } => {
                let course = self.authorize(&secret_key).await?;
                let homework_id = HomeworkId::derive(&course, homework_number);
                let payload: MetadataPayload = codec::deserialize(&payload)?;
                self.update_metadata(homework_id, payload).await
            }

            ApiRequest::UpdateTests {
                homework_number,
                secret_key,
                payload,
            } => {
                let course = self.authorize(&secret_key).await?;
                let homework_id = HomeworkId::derive(&course, homework_number);
                let payload: SuitePayload = codec::deserialize(&payload)?;
                self.update_tests(homework_id, payload).await
            }

            ApiRequest::AddCourse {
                secret_key,
                payload,
            } => {
                self.authorize(&secret_key).await?;
                let payload: NewCoursePayload = codec::deserialize(&payload)?;
                let course = CourseId(payload.course_id);
                self.courses
                    .add_course(&payload.secret_key, &course)
                    .await
                    .map_err(GradeError::from)?;
                info!(course_id = %course, "course registered");
                Ok(format!("Success! Course {course} registered."))
            }

            ApiRequest::Submit {
                homework_id,
                student_id,
                test_case_id,
                answer,
            } => {
                let homework_id = HomeworkId::parse(homework_id)?;
                let student = StudentId::new(student_id)?;
                let answer: Value = codec::deserialize(&answer)?;
                let outcome = self
                    .pipeline
                    .submit(&homework_id, &student, &test_case_id, answer)
                    .await?;
                Ok(outcome.message)
            }

            ApiRequest::StudentGrade {
                homework_id,
                student_id,
            } => {
                let homework_id = HomeworkId::parse(homework_id)?;
                let student = StudentId::new(student_id)?;
                let metadata = self.get_metadata(&homework_id).await?;
                let records = self
                    .gradebook
                    .scan(&homework_id, Some(&student))
                    .await
                    .map_err(|e| GradeError::PersistenceFailed(e.to_string()))?;
                let summary = summarize_student(&records, metadata.deadline, &student);
                codec::serialize(&StudentGradeReport {
                    records,
                    summary,
                    deadline: metadata.deadline,
                    max_daily_submissions: metadata.max_daily_submissions,
                    total_score: metadata.total_score,
                })
            }

            ApiRequest::AllStudentsGrades {
                homework_id,
                secret_key,
            } => {
                self.authorize(&secret_key).await?;
                let homework_id = HomeworkId::parse(homework_id)?;
                let metadata = self.get_metadata(&homework_id).await?;
                let records = self
                    .gradebook
                    .scan(&homework_id, None)
                    .await
                    .map_err(|e| GradeError::PersistenceFailed(e.to_string()))?;
                let summaries = summarize(&records, metadata.deadline);
                codec::serialize(&CourseGradeReport {
                    records,
                    summaries,
                    deadline: metadata.deadline,
                })
            }
        }
    }

    // -- instructor operations ----------------------------------------------

    async fn update_metadata(
        &self,
        homework_id: HomeworkId,
        payload: MetadataPayload,
    ) -> Result<String> {
        let metadata = HomeworkMetadata {
            homework_id: homework_id.clone(),
            deadline: payload.deadline,
            max_daily_submissions: payload.max_daily_submissions,
            total_score: payload.total_score,
        };
        self.metadata
            .put_metadata(metadata)
            .await
            .map_err(|e| GradeError::PersistenceFailed(e.to_string()))?;

        info!(homework_id = %homework_id, "metadata updated");
        Ok(format!(
            "Success! Metadata updated.\n\n\
             Total HW points: {}\n\
             Deadline: {}\n\
             Max daily submissions per test case: {}\n",
            payload.total_score, payload.deadline, payload.max_daily_submissions
        ))
    }

    async fn update_tests(&self, homework_id: HomeworkId, payload: SuitePayload) -> Result<String> {
        // Validate at upload time: every manifest entry and every grader
        // reference must resolve, so a broken suite is the instructor's
        // error now rather than a student's error later.
        let mut scratch = Bindings::new();
        resolve_manifest(&self.registry, &mut scratch, &payload.libraries)?;
        for case in payload.test_cases.values() {
            self.registry.grader(case)?;
        }

        let suite = TestSuite::new(payload.test_cases, payload.libraries);
        let digest = suite.short_digest().to_string();
        self.suites
            .put_suite(&homework_id, suite)
            .await
            .map_err(|e| GradeError::PersistenceFailed(e.to_string()))?;

        info!(homework_id = %homework_id, digest = %digest, "test suite updated");
        Ok(format!(
            "Success: test cases updated. Suite version {digest}."
        ))
    }

    // -- shared helpers ------------------------------------------------------

    async fn authorize(&self, secret_key: &str) -> Result<CourseId> {
        self.courses
            .course_for_key(secret_key)
            .await
            .map_err(|e| match e {
                StorageError::UnknownSecretKey => GradeError::InvalidSecretKey,
                other => GradeError::PersistenceFailed(other.to_string()),
            })
    }

    async fn get_metadata(&self, homework_id: &HomeworkId) -> Result<HomeworkMetadata> {
        self.metadata
            .get_metadata(homework_id)
            .await
            .map_err(|e| match e {
                StorageError::MetadataNotFound { homework_id } => {
                    GradeError::HomeworkNotFound { homework_id }
                }
                other => GradeError::PersistenceFailed(other.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_decoding_by_tag() {
        let raw = r#"{
            "request_type": "STUDENT_GRADE",
            "homework_id": "CIS545_F24_HW1",
            "student_id": "alice"
        }"#;
        let request: ApiRequest = serde_json::from_str(raw).unwrap();
        assert!(matches!(request, ApiRequest::StudentGrade { .. }));
    }

    #[test]
    fn test_unknown_request_type_fails_to_decode() {
        let raw = r#"{ "request_type": "DROP_TABLES" }"#;
        assert!(serde_json::from_str::<ApiRequest>(raw).is_err());
    }

    #[test]
    fn test_response_headers_carry_content_type() {
        let response = ApiResponse::ok("done".to_string());
        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert!(response.is_success());
    }

    #[test]
    fn test_error_response_carries_message() {
        let response = ApiResponse::error(&GradeError::InvalidSecretKey);
        assert_eq!(response.status_code, ERROR);
        assert!(response.body.contains("Secret key is incorrect"));
    }
}
