//! Test suites and grader references.
//!
//! The wire never carries executable code: a test case is a *reference* to
//! a grading function registered in the service's module registry, plus an
//! optional parameter payload. The suite digest (SHA-256 over the
//! canonical serialization) doubles as the suite's version.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::domain::manifest::LibraryManifest;

/// Reference to a statically registered grading function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraderRef {
    /// Registry module the function lives in.
    pub module: String,

    /// Function name within that module.
    pub function: String,

    /// Small per-case parameter payload handed to the function at grade
    /// time (expected answers, tolerances, point values, ...).
    #[serde(default)]
    pub params: serde_json::Value,
}

impl GraderRef {
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        GraderRef {
            module: module.into(),
            function: function.into(),
            params: serde_json::Value::Null,
        }
    }

    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    /// Dotted form used in error messages.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.function)
    }
}

/// The full set of named test cases for one homework, plus the manifest
/// required to run them.
///
/// Replaced wholesale by instructor updates; there is no per-case merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    pub cases: BTreeMap<String, GraderRef>,

    pub manifest: LibraryManifest,

    /// SHA-256 over the canonical serialization of (cases, manifest).
    pub digest: String,
}

impl TestSuite {
    /// Build a suite and compute its content digest.
    pub fn new(cases: BTreeMap<String, GraderRef>, manifest: LibraryManifest) -> Self {
        let digest = compute_suite_digest(&cases, &manifest);
        TestSuite {
            cases,
            manifest,
            digest,
        }
    }

    /// Short digest form (first 12 hex chars).
    pub fn short_digest(&self) -> &str {
        &self.digest[..12.min(self.digest.len())]
    }
}

/// Deterministic digest of a suite's cases and manifest.
///
/// `BTreeMap`/`BTreeSet` ordering makes the JSON canonical, so equal
/// suites always hash equal.
fn compute_suite_digest(cases: &BTreeMap<String, GraderRef>, manifest: &LibraryManifest) -> String {
    let mut hasher = Sha256::new();
    // Unwrap is fine: these types serialize infallibly.
    hasher.update(serde_json::to_vec(cases).unwrap_or_default());
    hasher.update(b"\0");
    hasher.update(serde_json::to_vec(manifest).unwrap_or_default());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn suite_with(case_id: &str) -> TestSuite {
        let mut cases = BTreeMap::new();
        cases.insert(
            case_id.to_string(),
            GraderRef::new("cis545_hw1", "grade_q1").with_params(json!({ "expected": 42 })),
        );
        TestSuite::new(cases, LibraryManifest::new())
    }

    #[test]
    fn test_suite_digest_deterministic() {
        assert_eq!(suite_with("q1").digest, suite_with("q1").digest);
    }

    #[test]
    fn test_suite_digest_sensitive_to_case_rename() {
        assert_ne!(suite_with("q1").digest, suite_with("q2").digest);
    }

    #[test]
    fn test_grader_ref_round_trip() {
        let original = GraderRef::new("cis545_hw1", "grade_q1").with_params(json!({ "pts": 10 }));
        let encoded = serde_json::to_string(&original).unwrap();
        let decoded: GraderRef = serde_json::from_str(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_grader_ref_params_default_to_null() {
        let decoded: GraderRef =
            serde_json::from_str(r#"{"module":"m","function":"f"}"#).unwrap();
        assert!(decoded.params.is_null());
    }
}
