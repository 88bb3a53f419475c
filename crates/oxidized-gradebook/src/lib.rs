//! Oxidized-Gradebook: SurrealDB Backend for Gradewire
//!
//! This crate provides the persistence layer for the grading service. It
//! handles all I/O with the backing store behind four narrow async traits:
//!
//! - `MetadataStore`: per-homework metadata (deadline, score policy)
//! - `TestSuiteStore`: the full-replace test suite per homework
//! - `GradebookStore`: last-write-wins submission records
//! - `CourseDirectory`: secret key -> course resolution
//!
//! All traits are backend-agnostic. In-memory fakes are provided for
//! testing via the `fakes` module; `SurrealGradeStore` implements all four
//! against SurrealDB (`mem://` for tests, `surrealkv`/WebSocket for
//! deployment).

mod error;
pub mod fakes;
mod migrations;
mod schema;
pub mod storage_traits;
mod surreal_store;

pub use error::StorageError;
pub use storage_traits::{
    CourseDirectory, GradebookStore, MetadataStore, StorageResult, TestSuiteStore,
};
pub use surreal_store::SurrealGradeStore;
