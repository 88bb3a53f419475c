//! Error types for oxidized-gradebook

use thiserror::Error;

use gradewire_core::GradeError;

/// Errors that can occur in the persistence layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Backend query error
    #[error("Database query failed: {0}")]
    Backend(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// No metadata stored for the homework
    #[error("Homework metadata not found: {homework_id}")]
    MetadataNotFound { homework_id: String },

    /// No test suite stored for the homework
    #[error("Test suite not found: {homework_id}")]
    SuiteNotFound { homework_id: String },

    /// Secret key resolves to no course
    #[error("Unknown secret key")]
    UnknownSecretKey,

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Lift a storage failure into the request-level taxonomy.
///
/// `SuiteNotFound` is intentionally NOT mapped here: only the caller knows
/// which test case it was looking for, so the pipeline translates it to
/// `TestCaseNotFound` itself.
impl From<StorageError> for GradeError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::MetadataNotFound { homework_id } => {
                GradeError::HomeworkNotFound { homework_id }
            }
            StorageError::UnknownSecretKey => GradeError::InvalidSecretKey,
            other => GradeError::PersistenceFailed(other.to_string()),
        }
    }
}
