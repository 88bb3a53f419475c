//! Gradewire Engine - the submission grading pipeline
//!
//! Provides the pieces between an inbound request and a gradebook row:
//! - A module registry of statically registered grading and helper
//!   functions (no data-to-code evaluation anywhere)
//! - A library-manifest resolver that materializes a binding table
//! - A grading executor that runs one function and contains its failures
//! - The pipeline that chains lookup, materialization, execution, and
//!   score capture
//! - The thin dispatch/authorization layer in front of all of it

pub mod dispatch;
pub mod executor;
pub mod pipeline;
pub mod registry;
pub mod resolver;

// Re-export key types
pub use dispatch::{ApiRequest, ApiResponse, GraderService, ERROR, SUCCESS};
pub use executor::execute;
pub use pipeline::{GradingOutcome, GradingPipeline};
pub use registry::{GradingFn, HelperFn, Module, ModuleRegistry};
pub use resolver::{resolve_manifest, Binding, Bindings};
