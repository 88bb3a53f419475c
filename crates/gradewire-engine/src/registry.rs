//! Module registry: the allow-list of grading and helper functions.
//!
//! Everything a manifest or a test case can name must be registered here
//! at build time. Resolution is a map lookup over registered names; there
//! is no path from wire data to code that was not explicitly registered.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use gradewire_core::{GradeError, GraderRef, Result, Score};

use crate::resolver::Bindings;

/// A helper function bindable through a library manifest.
pub type HelperFn = Arc<dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync>;

/// A grading function. Receives the materialized bindings, the test case's
/// parameter payload, and the student's answer; returns (score, max_score).
pub type GradingFn =
    Arc<dyn Fn(&Bindings, &Value, &Value) -> anyhow::Result<Score> + Send + Sync>;

/// A named collection of helpers and graders.
pub struct Module {
    name: String,
    helpers: HashMap<String, HelperFn>,
    graders: HashMap<String, GradingFn>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            helpers: HashMap::new(),
            graders: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a helper function under `name`.
    pub fn with_helper<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(f));
        self
    }

    /// Register a grading function under `name`.
    pub fn with_grader<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Bindings, &Value, &Value) -> anyhow::Result<Score> + Send + Sync + 'static,
    {
        self.graders.insert(name.into(), Arc::new(f));
        self
    }

    pub fn helper(&self, name: &str) -> Option<HelperFn> {
        self.helpers.get(name).cloned()
    }

    pub fn grader(&self, name: &str) -> Option<GradingFn> {
        self.graders.get(name).cloned()
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .field("graders", &self.graders.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Registry of every module the service knows about, keyed by module path.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the standard helper module.
    pub fn with_standard() -> Self {
        let mut registry = Self::new();
        registry.register(standard_checks());
        registry
    }

    /// Register a module under its own name. Re-registering a name
    /// replaces the module (deployment wiring runs once, before serving).
    pub fn register(&mut self, module: Module) -> &mut Self {
        self.modules
            .insert(module.name().to_string(), Arc::new(module));
        self
    }

    /// Look up a module by path.
    pub fn module(&self, path: &str) -> Option<Arc<Module>> {
        self.modules.get(path).cloned()
    }

    /// Resolve a grader reference to its registered function.
    pub fn grader(&self, case: &GraderRef) -> Result<GradingFn> {
        let module = self
            .module(&case.module)
            .ok_or_else(|| GradeError::DependencyUnavailable {
                name: case.module.clone(),
            })?;
        module
            .grader(&case.function)
            .ok_or_else(|| GradeError::DependencyUnavailable {
                name: case.qualified_name(),
            })
    }
}

/// The `checks` module: small comparison helpers courses can pull into a
/// manifest instead of reimplementing them per grader.
pub fn standard_checks() -> Module {
    Module::new("checks")
        .with_helper("approx_equal", |input| {
            let actual = input
                .get("actual")
                .and_then(Value::as_f64)
                .ok_or_else(|| anyhow::anyhow!("approx_equal requires numeric 'actual'"))?;
            let expected = input
                .get("expected")
                .and_then(Value::as_f64)
                .ok_or_else(|| anyhow::anyhow!("approx_equal requires numeric 'expected'"))?;
            let tolerance = input.get("tolerance").and_then(Value::as_f64).unwrap_or(1e-6);
            Ok(Value::Bool((actual - expected).abs() <= tolerance))
        })
        .with_helper("normalize_text", |input| {
            let text = input
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("normalize_text requires a string"))?;
            Ok(Value::String(text.trim().to_lowercase()))
        })
}
