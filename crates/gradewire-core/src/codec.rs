//! Wire codec: JSON serialized, base64 text encoded.
//!
//! Answers, test suites, manifests, and grade reports all cross the
//! transport boundary as opaque text blobs produced here. Anything that
//! fails to decode is a [`GradeError::MalformedPayload`] before any core
//! logic sees it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{GradeError, Result};

/// Encode a value as base64 text over its JSON form.
pub fn serialize<T: Serialize>(value: &T) -> Result<String> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| GradeError::malformed(format!("unencodable value: {e}")))?;
    Ok(STANDARD.encode(bytes))
}

/// Decode a base64 text blob back into a value.
pub fn deserialize<T: DeserializeOwned>(text: &str) -> Result<T> {
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|e| GradeError::malformed(format!("undecodable body: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| GradeError::malformed(format!("undecodable body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GraderRef, LibraryManifest, TestSuite};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_round_trip_plain_value() {
        let answer = json!({ "answer": 42, "parts": [1, 2, 3] });
        let text = serialize(&answer).unwrap();
        let back: serde_json::Value = deserialize(&text).unwrap();
        assert_eq!(answer, back);
    }

    #[test]
    fn test_round_trip_test_suite() {
        let mut cases = BTreeMap::new();
        cases.insert(
            "q1".to_string(),
            GraderRef::new("cis545_hw1", "grade_q1").with_params(json!({ "expected": 42 })),
        );
        let suite = TestSuite::new(cases, LibraryManifest::new());

        let text = serialize(&suite).unwrap();
        let back: TestSuite = deserialize(&text).unwrap();
        assert_eq!(suite, back);
    }

    #[test]
    fn test_garbage_fails_as_malformed() {
        let err = deserialize::<serde_json::Value>("not-base64!!").unwrap_err();
        assert!(matches!(err, GradeError::MalformedPayload(_)));
    }

    #[test]
    fn test_wrong_shape_fails_as_malformed() {
        let text = serialize(&json!("just a string")).unwrap();
        let err = deserialize::<TestSuite>(&text).unwrap_err();
        assert!(matches!(err, GradeError::MalformedPayload(_)));
    }
}
