//! Error types for grading operations
//!
//! Every variant is terminal for the request that produced it; the dispatch
//! boundary converts each one into a 400-style response carrying the
//! `Display` message. Nothing here is retried by the service itself.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GradeError {
    /// The inbound request body could not be decoded, or a field failed
    /// domain validation before any core logic ran.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Secret key is incorrect.")]
    InvalidSecretKey,

    #[error("Homework {homework_id} was not found.")]
    HomeworkNotFound { homework_id: String },

    #[error("Test case {test_case_id} was not found.")]
    TestCaseNotFound { test_case_id: String },

    /// A manifest entry or grader reference names something the module
    /// registry does not provide. Configuration error, not student-facing.
    #[error("[{name}] is not currently supported. Let a TA know you got this error.")]
    DependencyUnavailable { name: String },

    /// The grading function itself failed. The hint carries the underlying
    /// failure's message and nothing else.
    #[error("Test case failed. The grading function could not complete due to an error in your answer.\nError hint: {hint}")]
    GradingFailed { hint: String },

    #[error("We could not record this in the gradebook ({0}). It is not your fault, please try again or ask a TA.")]
    PersistenceFailed(String),
}

impl GradeError {
    /// Convenience constructor for payload validation failures.
    pub fn malformed(detail: impl Into<String>) -> Self {
        GradeError::MalformedPayload(detail.into())
    }
}

/// Result type for grading operations
pub type Result<T> = std::result::Result<T, GradeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_unavailable_names_the_missing_identifier() {
        let err = GradeError::DependencyUnavailable {
            name: "sklearn.svm".to_string(),
        };
        assert!(err.to_string().contains("sklearn.svm"));
    }

    #[test]
    fn test_grading_failed_preserves_hint() {
        let err = GradeError::GradingFailed {
            hint: "expected a list of length 3".to_string(),
        };
        assert!(err.to_string().contains("expected a list of length 3"));
    }
}
