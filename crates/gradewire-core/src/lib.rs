//! Gradewire Domain Model
//!
//! Defines the shared vocabulary of the grading service:
//! - HomeworkId / StudentId: validated identifiers
//! - HomeworkMetadata: deadline, total score, submission policy
//! - TestSuite / GraderRef / LibraryManifest: what to grade with
//! - SubmissionRecord: the stored outcome of one grading attempt
//! - StudentSummary: per-student rollup with lateness
//!
//! Also hosts the error taxonomy, the base64-over-JSON wire codec, and the
//! aggregation & lateness engine. Everything here is pure: no I/O, no
//! storage, no execution.

pub mod codec;
pub mod domain;
pub mod error;
pub mod summary;

pub use domain::{
    CourseId, GraderRef, HomeworkId, HomeworkMetadata, LibraryManifest, Score, StudentId,
    SubmissionRecord, TestSuite, KEY_SEPARATOR,
};
pub use error::{GradeError, Result};
pub use summary::{summarize, summarize_student, summarize_with_offset, StudentSummary};

/// Gradewire domain version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
