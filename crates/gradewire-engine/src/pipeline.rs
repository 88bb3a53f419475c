//! Submission grading pipeline: lookup, materialize, execute, record.
//!
//! One entry point, [`GradingPipeline::submit`], chains the four stages of
//! a grading pass. The gradebook write happens strictly after a successful
//! grade, so no failure path leaves partial state behind.

use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::info;

use gradewire_core::{GradeError, HomeworkId, Result, Score, StudentId, SubmissionRecord};
use oxidized_gradebook::{GradebookStore, StorageError, TestSuiteStore};

use crate::executor;
use crate::registry::ModuleRegistry;
use crate::resolver::{resolve_manifest, Bindings};

/// Result of one complete grading pass.
#[derive(Debug, Clone)]
pub struct GradingOutcome {
    /// The stored gradebook record.
    pub record: SubmissionRecord,

    /// The grade as returned by the grading function.
    pub score: Score,

    /// Student-facing result message.
    pub message: String,
}

/// The submission grading pipeline.
///
/// Holds the worker's binding table: additive-only, first-insert-wins,
/// shared across every grading pass for the worker's lifetime. Concurrent
/// first-use races on the same name are harmless because re-resolution is
/// idempotent.
pub struct GradingPipeline {
    registry: Arc<ModuleRegistry>,
    bindings: RwLock<Bindings>,
    suites: Arc<dyn TestSuiteStore>,
    gradebook: Arc<dyn GradebookStore>,
}

impl GradingPipeline {
    pub fn new(
        registry: Arc<ModuleRegistry>,
        suites: Arc<dyn TestSuiteStore>,
        gradebook: Arc<dyn GradebookStore>,
    ) -> Self {
        GradingPipeline {
            registry,
            bindings: RwLock::new(Bindings::new()),
            suites,
            gradebook,
        }
    }

    /// Grade one submission and record the result.
    ///
    /// Stages:
    /// 1. Look up the test case and manifest for (homework, test case)
    /// 2. Materialize the manifest into the worker's binding table
    /// 3. Execute the grading function against the answer
    /// 4. Upsert the resulting score into the gradebook
    pub async fn submit(
        &self,
        homework_id: &HomeworkId,
        student: &StudentId,
        test_case_id: &str,
        answer: Value,
    ) -> Result<GradingOutcome> {
        info!(
            homework_id = %homework_id,
            test_case_id = %test_case_id,
            "grading submission"
        );

        let suite = match self.suites.get_suite(homework_id).await {
            Ok(suite) => suite,
            Err(StorageError::SuiteNotFound { .. }) => {
                return Err(GradeError::TestCaseNotFound {
                    test_case_id: test_case_id.to_string(),
                })
            }
            Err(other) => return Err(other.into()),
        };

        let case = suite
            .cases
            .get(test_case_id)
            .ok_or_else(|| GradeError::TestCaseNotFound {
                test_case_id: test_case_id.to_string(),
            })?;

        // Merge the manifest into the shared table and snapshot it for the
        // executor. The guard is dropped before any await point.
        let snapshot = {
            let mut bindings = self
                .bindings
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            resolve_manifest(&self.registry, &mut bindings, &suite.manifest)?;
            bindings.clone()
        };

        let grader = self.registry.grader(case)?;
        let score = executor::execute(grader, snapshot, case.params.clone(), answer).await?;

        let record = self
            .gradebook
            .upsert(homework_id, student, test_case_id, score)
            .await
            .map_err(|e| GradeError::PersistenceFailed(e.to_string()))?;

        info!(
            homework_id = %homework_id,
            submission = %record.student_submission_id,
            student_score = score.student_score,
            max_score = score.max_score,
            "submission recorded"
        );

        Ok(GradingOutcome {
            message: score_message(&score),
            record,
            score,
        })
    }

    /// Snapshot of the worker's current binding table.
    pub fn bindings(&self) -> Bindings {
        self.bindings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Student-facing result message for a graded submission.
pub fn score_message(score: &Score) -> String {
    if score.is_full() {
        format!(
            "Correct! You earned {}/{} points. You are a star!\n\n\
             Your submission has been successfully recorded in the gradebook.",
            score.student_score, score.max_score
        )
    } else {
        format!(
            "You earned {}/{} points.\n\n\
             But, don't worry you can re-submit and we will keep only your latest score.",
            score.student_score, score.max_score
        )
    }
}
