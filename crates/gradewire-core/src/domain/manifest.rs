//! Library manifests: the declared dependencies of a test suite.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Declarative list of everything a suite's grading functions need bound
/// before they can run.
///
/// Resolution order is fixed: `packages`, then `imports`, then `functions`
/// (functions may rely on modules bound by the earlier stages, never the
/// other way around). `BTreeSet` keeps serialization canonical so suite
/// digests are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryManifest {
    /// Base package names, bound under their own name.
    pub packages: BTreeSet<String>,

    /// (module path, alias) pairs; the module is bound under the alias.
    pub imports: BTreeSet<(String, String)>,

    /// (module path, function name) pairs; the function is bound under its
    /// own name.
    pub functions: BTreeSet<(String, String)>,
}

impl LibraryManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.imports.is_empty() && self.functions.is_empty()
    }

    /// Total number of manifest entries.
    pub fn len(&self) -> usize {
        self.packages.len() + self.imports.len() + self.functions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_serialization_is_canonical() {
        let mut a = LibraryManifest::new();
        a.packages.insert("stats".to_string());
        a.packages.insert("checks".to_string());

        let mut b = LibraryManifest::new();
        b.packages.insert("checks".to_string());
        b.packages.insert("stats".to_string());

        let ja = serde_json::to_string(&a).unwrap();
        let jb = serde_json::to_string(&b).unwrap();
        assert_eq!(ja, jb);
    }

    #[test]
    fn test_manifest_len() {
        let mut m = LibraryManifest::new();
        assert!(m.is_empty());
        m.packages.insert("stats".to_string());
        m.imports
            .insert(("stats.describe".to_string(), "describe".to_string()));
        m.functions
            .insert(("checks".to_string(), "approx_equal".to_string()));
        assert_eq!(m.len(), 3);
    }
}
