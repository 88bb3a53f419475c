//! Grading execution: run one grading function against one answer.
//!
//! The function runs on the blocking pool with panic containment. Any
//! failure, whether an `Err` from the grader or a panic raised while it
//! handled student-influenced input, becomes a single `GradingFailed`
//! carrying the failure's message as a hint. A failed grade never yields
//! a partial score.
//!
//! No timeout, resource limit, or isolation boundary is imposed here;
//! registered graders run with the service's own trust level. Deployments
//! that grade untrusted code must wrap this in a real sandbox.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;
use tracing::debug;

use gradewire_core::{GradeError, Result, Score};

use crate::registry::GradingFn;
use crate::resolver::Bindings;

/// Invoke `grader` on the blocking pool and capture its outcome.
pub async fn execute(
    grader: GradingFn,
    bindings: Bindings,
    params: Value,
    answer: Value,
) -> Result<Score> {
    let joined =
        tokio::task::spawn_blocking(move || grade_once(&grader, &bindings, &params, &answer))
            .await;

    match joined {
        Ok(result) => result,
        // The closure contains its own panics, so a join error means the
        // runtime tore the task down underneath us.
        Err(e) => Err(GradeError::GradingFailed {
            hint: e.to_string(),
        }),
    }
}

/// Synchronous core: call the grader with panics contained.
pub fn grade_once(
    grader: &GradingFn,
    bindings: &Bindings,
    params: &Value,
    answer: &Value,
) -> Result<Score> {
    let outcome = catch_unwind(AssertUnwindSafe(|| grader(bindings, params, answer)));

    match outcome {
        Ok(Ok(score)) => {
            debug!(
                student_score = score.student_score,
                max_score = score.max_score,
                "grading function returned"
            );
            Ok(score)
        }
        Ok(Err(err)) => Err(GradeError::GradingFailed {
            hint: err.to_string(),
        }),
        Err(panic) => Err(GradeError::GradingFailed {
            hint: panic_hint(panic),
        }),
    }
}

fn panic_hint(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "grading function panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn answer_is_42() -> GradingFn {
        Arc::new(|_bindings, _params, answer| {
            let score = if answer.as_i64() == Some(42) { 10.0 } else { 0.0 };
            Ok(Score::new(score, 10.0))
        })
    }

    #[tokio::test]
    async fn test_correct_answer_scores_full() {
        let score = execute(
            answer_is_42(),
            Bindings::new(),
            Value::Null,
            serde_json::json!(42),
        )
        .await
        .unwrap();
        assert_eq!(score.student_score, 10.0);
        assert_eq!(score.max_score, 10.0);
    }

    #[tokio::test]
    async fn test_wrong_answer_scores_zero() {
        let score = execute(
            answer_is_42(),
            Bindings::new(),
            Value::Null,
            serde_json::json!(7),
        )
        .await
        .unwrap();
        assert_eq!(score.student_score, 0.0);
    }

    #[tokio::test]
    async fn test_grader_error_becomes_grading_failed_with_hint() {
        let grader: GradingFn = Arc::new(|_b, _p, _a| {
            anyhow::bail!("expected a list of length 3")
        });
        let err = execute(grader, Bindings::new(), Value::Null, Value::Null)
            .await
            .unwrap_err();
        match err {
            GradeError::GradingFailed { hint } => {
                assert!(hint.contains("expected a list of length 3"))
            }
            other => panic!("expected GradingFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_grader_panic_is_contained() {
        let grader: GradingFn = Arc::new(|_b, _p, answer| {
            // Index panics when the answer is too short, the classic
            // student-input failure mode.
            let parts = answer.as_array().unwrap();
            let _ = &parts[5];
            Ok(Score::new(0.0, 10.0))
        });
        let err = execute(
            grader,
            Bindings::new(),
            Value::Null,
            serde_json::json!([1]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GradeError::GradingFailed { .. }));
    }

    #[test]
    fn test_grade_once_panic_hint_preserves_message() {
        let grader: GradingFn = Arc::new(|_b, _p, _a| panic!("boom in grading logic"));
        let err = grade_once(&grader, &Bindings::new(), &Value::Null, &Value::Null).unwrap_err();
        match err {
            GradeError::GradingFailed { hint } => assert!(hint.contains("boom in grading logic")),
            other => panic!("expected GradingFailed, got {other:?}"),
        }
    }
}
