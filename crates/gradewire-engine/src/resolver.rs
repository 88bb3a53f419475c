//! Library manifest resolution.
//!
//! Turns the declarative `LibraryManifest` of a test suite into a live
//! binding table the executor hands to grading functions. The table is an
//! explicit, owned value (never a process global): the service keeps one
//! per worker, merges are additive-only and first-insert-wins, and nothing
//! is ever evicted. Re-resolving a stable manifest is therefore idempotent.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use gradewire_core::{GradeError, LibraryManifest, Result};

use crate::registry::{HelperFn, Module, ModuleRegistry};

/// Names under the framework's own namespace are never bound from a
/// manifest; they are part of the standard execution context.
pub const FRAMEWORK_NAMESPACE: &str = "gradewire";

/// One resolved entry in the binding table.
#[derive(Clone)]
pub enum Binding {
    Module(Arc<Module>),
    Function(HelperFn),
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Module(m) => write!(f, "Module({})", m.name()),
            Binding::Function(_) => write!(f, "Function"),
        }
    }
}

/// Name -> binding table available to grading functions at run time.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: HashMap<String, Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    /// Look up a bound helper function by name.
    pub fn function(&self, name: &str) -> Option<HelperFn> {
        match self.entries.get(name) {
            Some(Binding::Function(f)) => Some(f.clone()),
            _ => None,
        }
    }

    /// Look up a bound module by name.
    pub fn module(&self, name: &str) -> Option<Arc<Module>> {
        match self.entries.get(name) {
            Some(Binding::Module(m)) => Some(m.clone()),
            _ => None,
        }
    }

    /// First-insert-wins: an existing binding is never replaced.
    fn insert_first(&mut self, name: String, binding: Binding) {
        self.entries.entry(name).or_insert(binding);
    }
}

/// Materialize a manifest into `bindings`, resolving every entry against
/// the registry.
///
/// Resolution order is packages, then imports, then functions. Entries are
/// staged and merged only on full success: a manifest that fails leaves
/// `bindings` exactly as it was (no partial binding is ever usable).
/// Failure names the specific missing identifier.
pub fn resolve_manifest(
    registry: &ModuleRegistry,
    bindings: &mut Bindings,
    manifest: &LibraryManifest,
) -> Result<()> {
    let mut staged: Vec<(String, Binding)> = Vec::new();

    for package in &manifest.packages {
        let base = package.split('.').next().unwrap_or(package);
        if bindings.contains(base) || base.contains(FRAMEWORK_NAMESPACE) {
            continue;
        }
        let module = registry
            .module(base)
            .ok_or_else(|| GradeError::DependencyUnavailable {
                name: base.to_string(),
            })?;
        debug!(package = %base, "binding base package");
        staged.push((base.to_string(), Binding::Module(module)));
    }

    for (module_path, alias) in &manifest.imports {
        if bindings.contains(alias) || module_path.contains(FRAMEWORK_NAMESPACE) {
            continue;
        }
        let module =
            registry
                .module(module_path)
                .ok_or_else(|| GradeError::DependencyUnavailable {
                    name: module_path.clone(),
                })?;
        debug!(module = %module_path, alias = %alias, "binding import");
        staged.push((alias.clone(), Binding::Module(module)));
    }

    for (module_path, function_name) in &manifest.functions {
        let module =
            registry
                .module(module_path)
                .ok_or_else(|| GradeError::DependencyUnavailable {
                    name: module_path.clone(),
                })?;
        let helper =
            module
                .helper(function_name)
                .ok_or_else(|| GradeError::DependencyUnavailable {
                    name: format!("{module_path}.{function_name}"),
                })?;
        debug!(module = %module_path, function = %function_name, "binding function");
        staged.push((function_name.clone(), Binding::Function(helper)));
    }

    for (name, binding) in staged {
        bindings.insert_first(name, binding);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::standard_checks;
    use gradewire_core::GradeError;

    fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.register(standard_checks());
        registry.register(Module::new("stats").with_helper("mean", |input| {
            let values = input
                .as_array()
                .ok_or_else(|| anyhow::anyhow!("mean requires an array"))?;
            let sum: f64 = values.iter().filter_map(|v| v.as_f64()).sum();
            Ok(serde_json::json!(sum / values.len().max(1) as f64))
        }));
        registry
    }

    fn manifest() -> LibraryManifest {
        let mut manifest = LibraryManifest::new();
        manifest.packages.insert("stats".to_string());
        manifest
            .imports
            .insert(("checks".to_string(), "ck".to_string()));
        manifest
            .functions
            .insert(("checks".to_string(), "approx_equal".to_string()));
        manifest
    }

    #[test]
    fn test_resolves_packages_imports_and_functions() {
        let registry = registry();
        let mut bindings = Bindings::new();
        resolve_manifest(&registry, &mut bindings, &manifest()).unwrap();

        assert!(bindings.module("stats").is_some());
        assert!(bindings.module("ck").is_some());
        assert!(bindings.function("approx_equal").is_some());
        assert_eq!(bindings.len(), 3);
    }

    #[test]
    fn test_re_resolution_is_superset_equal() {
        let registry = registry();
        let mut bindings = Bindings::new();
        resolve_manifest(&registry, &mut bindings, &manifest()).unwrap();
        let len_before = bindings.len();

        resolve_manifest(&registry, &mut bindings, &manifest()).unwrap();
        assert_eq!(bindings.len(), len_before, "no name may be rebound");
        for name in ["stats", "ck", "approx_equal"] {
            assert!(bindings.contains(name));
        }
    }

    #[test]
    fn test_missing_package_aborts_without_partial_bindings() {
        let registry = registry();
        let mut manifest = manifest();
        manifest.packages.insert("zmissing".to_string());

        let mut bindings = Bindings::new();
        let err = resolve_manifest(&registry, &mut bindings, &manifest).unwrap_err();
        assert!(matches!(
            err,
            GradeError::DependencyUnavailable { ref name } if name == "zmissing"
        ));
        assert!(
            bindings.is_empty(),
            "failed manifest must not leave partial bindings"
        );
    }

    #[test]
    fn test_missing_function_names_qualified_identifier() {
        let registry = registry();
        let mut manifest = LibraryManifest::new();
        manifest
            .functions
            .insert(("checks".to_string(), "no_such_fn".to_string()));

        let mut bindings = Bindings::new();
        let err = resolve_manifest(&registry, &mut bindings, &manifest).unwrap_err();
        assert!(matches!(
            err,
            GradeError::DependencyUnavailable { ref name } if name == "checks.no_such_fn"
        ));
    }

    #[test]
    fn test_framework_namespace_is_skipped() {
        let registry = registry();
        let mut manifest = LibraryManifest::new();
        manifest.packages.insert("gradewire".to_string());
        manifest.packages.insert("gradewire_client".to_string());

        let mut bindings = Bindings::new();
        resolve_manifest(&registry, &mut bindings, &manifest).unwrap();
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_already_bound_alias_is_not_rebound() {
        let registry = registry();
        let mut bindings = Bindings::new();

        // Bind "ck" to stats first; a later manifest pointing "ck" at
        // checks must not rebind it.
        let mut first = LibraryManifest::new();
        first
            .imports
            .insert(("stats".to_string(), "ck".to_string()));
        resolve_manifest(&registry, &mut bindings, &first).unwrap();

        let mut second = LibraryManifest::new();
        second
            .imports
            .insert(("checks".to_string(), "ck".to_string()));
        resolve_manifest(&registry, &mut bindings, &second).unwrap();

        assert_eq!(bindings.module("ck").unwrap().name(), "stats");
    }

    #[test]
    fn test_dotted_package_binds_base_name() {
        let registry = registry();
        let mut manifest = LibraryManifest::new();
        manifest.packages.insert("stats.rolling".to_string());

        let mut bindings = Bindings::new();
        resolve_manifest(&registry, &mut bindings, &manifest).unwrap();
        assert!(bindings.module("stats").is_some());
    }
}
