//! Core domain objects for the grading service.

pub mod homework;
pub mod manifest;
pub mod submission;
pub mod testcase;

pub use homework::{CourseId, HomeworkId, HomeworkMetadata};
pub use manifest::LibraryManifest;
pub use submission::{Score, StudentId, SubmissionRecord, KEY_SEPARATOR};
pub use testcase::{GraderRef, TestSuite};
