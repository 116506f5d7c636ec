//! CB-012: Resolution pipeline and batch validation.
//!
//! select root version -> build graph -> per node bottom-up:
//! merge over base, compose dependencies -> scale root -> validate.
//!
//! Composed (unscaled) forms are memoized in a [`ResolutionCache`] keyed by
//! (id, version). The cache is owned by the caller and scoped to one request,
//! so a shared dependency is resolved once and every consumer in that request
//! reads the same value.

use super::compose::compose;
use super::error::{ResolveError, Result};
use super::fingerprint::fingerprint;
use super::graph::{self, DependencyGraph};
use super::merge::merge;
use super::scale::{scale, substitute_vars, ScaleRequest};
use super::store::RecipeLookup;
use super::types::{NodeKey, ResolvedRecipe};
use super::validate::{validate, Violation};
use super::version::{self, SemverPrecedence, VersionOrder};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Composed forms already computed in this request.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<NodeKey, ResolvedRecipe>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &NodeKey) -> Option<&ResolvedRecipe> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn require(&self, key: &NodeKey) -> Result<&ResolvedRecipe> {
        self.entries
            .get(key)
            .ok_or_else(|| ResolveError::UnknownVersion {
                id: key.id.clone(),
                version: key.version.clone(),
            })
    }
}

/// One resolution request.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    pub id: String,
    /// Exact version; wins over `constraint`
    pub version: Option<String>,
    pub constraint: Option<String>,
    pub scale: ScaleRequest,
}

impl ResolveRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn with_scale(mut self, scale: ScaleRequest) -> Self {
        self.scale = scale;
        self
    }
}

/// The engine's output: the final recipe plus what it was built from.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub recipe: ResolvedRecipe,
    pub graph: DependencyGraph,
    /// Advisory findings; empty when the recipe is structurally sound
    pub violations: Vec<Violation>,
    pub fingerprint: String,
}

impl Resolution {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Resolves recipes from a lookup under a version ordering.
pub struct Resolver<'a, L: RecipeLookup + ?Sized> {
    lookup: &'a L,
    order: &'a dyn VersionOrder,
}

impl<'a, L: RecipeLookup + ?Sized> Resolver<'a, L> {
    /// Resolver using semantic-version precedence.
    pub fn new(lookup: &'a L) -> Self {
        Self {
            lookup,
            order: &SemverPrecedence,
        }
    }

    pub fn with_order(lookup: &'a L, order: &'a dyn VersionOrder) -> Self {
        Self { lookup, order }
    }

    /// Concrete root version for a request.
    pub fn select_version(&self, request: &ResolveRequest) -> Result<String> {
        let Some(version) = &request.version else {
            return version::select(
                self.lookup,
                &request.id,
                request.constraint.as_deref(),
                self.order,
            );
        };
        let known = self.lookup.list_versions(&request.id)?;
        if known.is_empty() {
            return Err(ResolveError::UnknownEntity {
                id: request.id.clone(),
            });
        }
        if !known.contains(version) {
            return Err(ResolveError::UnknownVersion {
                id: request.id.clone(),
                version: version.clone(),
            });
        }
        Ok(version.clone())
    }

    /// Resolve with a fresh request-scoped cache.
    pub fn resolve(&self, request: &ResolveRequest) -> Result<Resolution> {
        let mut cache = ResolutionCache::new();
        self.resolve_with_cache(request, &mut cache)
    }

    /// Resolve, reusing and filling `cache`.
    pub fn resolve_with_cache(
        &self,
        request: &ResolveRequest,
        cache: &mut ResolutionCache,
    ) -> Result<Resolution> {
        let version = self.select_version(request)?;
        let graph = graph::build(self.lookup, &request.id, &version, self.order)?;

        for key in graph.resolution_order() {
            if cache.contains(key) {
                debug!(recipe = %key, "reusing resolved form");
                continue;
            }
            let composed = self.compose_node(&graph, key, cache)?;
            cache.entries.insert(key.clone(), composed);
        }

        let composed = cache.require(graph.root())?.clone();
        let recipe = scale(composed, &request.scale)?;
        let violations = validate(&recipe);
        let fingerprint = fingerprint(&recipe)?;

        info!(
            recipe = %graph.root(),
            nodes = graph.len(),
            violations = violations.len(),
            %fingerprint,
            "resolved"
        );
        Ok(Resolution {
            recipe,
            graph,
            violations,
            fingerprint,
        })
    }

    /// Merged and composed form of one node. Its base and dependencies are
    /// already in the cache.
    fn compose_node(
        &self,
        graph: &DependencyGraph,
        key: &NodeKey,
        cache: &ResolutionCache,
    ) -> Result<ResolvedRecipe> {
        let doc = graph.doc(key).ok_or_else(|| ResolveError::UnknownVersion {
            id: key.id.clone(),
            version: key.version.clone(),
        })?;

        let pre = match graph.base_of(key) {
            Some(base) => merge(cache.require(base)?, doc)?,
            None => ResolvedRecipe::from_doc(doc),
        };

        let mut deps = HashMap::new();
        for use_ref in &doc.uses {
            let dep_key =
                graph
                    .dependency_of(key, &use_ref.id)
                    .ok_or_else(|| ResolveError::UnknownEntity {
                        id: use_ref.recipe.clone(),
                    })?;
            // dependencies are imported with their own default vars applied
            let dep = substitute_vars(cache.require(dep_key)?.clone())?;
            deps.insert(use_ref.id.clone(), dep);
        }

        compose(pre, &doc.uses, &deps)
    }

    // ========================================================================
    // Batch validation
    // ========================================================================

    /// Resolve and validate one (id, version) with default parameters.
    pub fn validate_entry(&self, id: &str, version: &str) -> BatchEntry {
        let key = NodeKey::new(id, version);
        let request = ResolveRequest::new(id).with_version(version);
        let outcome = match self.resolve(&request) {
            Ok(r) if r.is_valid() => Outcome::Valid {
                fingerprint: r.fingerprint,
            },
            Ok(r) => {
                warn!(recipe = %key, violations = r.violations.len(), "invalid");
                Outcome::Invalid(r.violations)
            }
            Err(e) => {
                warn!(recipe = %key, error = %e, "resolution failed");
                Outcome::Failed(e)
            }
        };
        BatchEntry { key, outcome }
    }

    /// Every known version of one recipe, oldest first.
    pub fn validate_recipe(&self, id: &str) -> Result<BatchReport> {
        let known = self.lookup.list_versions(id)?;
        if known.is_empty() {
            return Err(ResolveError::UnknownEntity { id: id.to_string() });
        }
        let entries = version::sort_versions(&known, self.order)
            .iter()
            .map(|v| self.validate_entry(id, v))
            .collect();
        Ok(BatchReport { entries })
    }

    /// Every known (id, version) pair, each resolved independently.
    /// Only a failure to enumerate recipes aborts the batch; a recipe whose
    /// versions cannot be listed is recorded as one failed entry.
    pub fn validate_all(&self) -> Result<BatchReport> {
        let mut entries = Vec::new();
        for id in self.lookup.list_recipes()? {
            match self.validate_recipe(&id) {
                Ok(report) => entries.extend(report.entries),
                Err(e) => {
                    warn!(recipe = %id, error = %e, "cannot list versions");
                    entries.push(BatchEntry {
                        key: NodeKey::new(id, "*"),
                        outcome: Outcome::Failed(e),
                    });
                }
            }
        }
        let report = BatchReport { entries };
        info!(
            total = report.entries.len(),
            failed = report.failures().count(),
            "batch validation complete"
        );
        Ok(report)
    }
}

/// Result for one (id, version) in a batch.
#[derive(Debug)]
pub enum Outcome {
    Valid { fingerprint: String },
    Invalid(Vec<Violation>),
    Failed(ResolveError),
}

#[derive(Debug)]
pub struct BatchEntry {
    pub key: NodeKey,
    pub outcome: Outcome,
}

impl BatchEntry {
    pub fn is_valid(&self) -> bool {
        matches!(self.outcome, Outcome::Valid { .. })
    }
}

/// Aggregate of a batch validation run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter().filter(|e| !e.is_valid())
    }

    pub fn valid_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_valid()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// All violations across the batch, in entry order.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.entries.iter().flat_map(|e| {
            let found: &[Violation] = match &e.outcome {
                Outcome::Invalid(v) => v,
                _ => &[],
            };
            found
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scale::RequestedYield;
    use crate::core::store::MemoryStore;
    use crate::core::types::{Quantity, RecipeDoc};
    use crate::core::validate::ViolationKind;
    use std::cell::RefCell;

    fn store(docs: &[&str]) -> MemoryStore {
        let mut s = MemoryStore::new();
        for d in docs {
            s.insert_json(d).unwrap();
        }
        s
    }

    fn qty(r: &ResolvedRecipe, id: &str) -> f64 {
        r.ingredients
            .iter()
            .find(|i| i.id == id)
            .and_then(|i| i.quantity.as_ref())
            .and_then(Quantity::as_amount)
            .unwrap()
    }

    fn step_ids(r: &ResolvedRecipe) -> Vec<&str> {
        r.steps.iter().map(|s| s.id.as_str()).collect()
    }

    const BROTH: &str = r#"{"id": "broth", "version": "1.0.0",
        "vars": {"minutes": 90},
        "ingredients": [{"id": "bones", "name": "Bones", "quantity": 1000, "unit": "g"}],
        "steps": [
            {"id": "roast", "text": "Roast the bones"},
            {"id": "boil", "text": "Boil for {{vars.minutes}} min", "depends_on": ["roast"]}
        ]}"#;

    /// Lookup wrapper recording every load.
    struct Recording<'a> {
        inner: &'a MemoryStore,
        loads: RefCell<Vec<NodeKey>>,
    }

    impl RecipeLookup for Recording<'_> {
        fn list_recipes(&self) -> Result<Vec<String>> {
            self.inner.list_recipes()
        }
        fn list_versions(&self, id: &str) -> Result<Vec<String>> {
            self.inner.list_versions(id)
        }
        fn load(&self, id: &str, version: &str) -> Result<RecipeDoc> {
            self.loads.borrow_mut().push(NodeKey::new(id, version));
            self.inner.load(id, version)
        }
    }

    #[test]
    fn test_cb012_identity_for_plain_recipe() {
        let raw = r#"{"id": "toast", "version": "1.0.0",
            "ingredients": [{"id": "bread", "name": "Bread", "quantity": 2, "unit": "slice"}],
            "steps": [{"id": "toast", "text": "Toast"}, {"id": "butter", "text": "Butter", "depends_on": ["toast"]}]}"#;
        let s = store(&[raw]);
        let doc: RecipeDoc = serde_json::from_str(raw).unwrap();
        let r = Resolver::new(&s).resolve(&ResolveRequest::new("toast")).unwrap();
        assert_eq!(r.recipe.ingredients, doc.ingredients);
        assert_eq!(r.recipe.steps, doc.steps);
        assert!(r.is_valid());
    }

    #[test]
    fn test_cb012_derivation_depth_two() {
        let s = store(&[
            r#"{"id": "b", "version": "1.0.0",
                "ingredients": [{"id": "x", "name": "X", "quantity": 1, "unit": "g"}]}"#,
            r#"{"id": "l", "version": "1.0.0", "derives_from": {"id": "b",
                "ingredient_patches": [{"op": "replace", "id": "x",
                    "data": {"name": "X", "quantity": 2, "unit": "g"}}]}}"#,
            r#"{"id": "ll", "version": "1.0.0", "derives_from": {"id": "l",
                "ingredient_patches": [{"op": "add", "id": "y",
                    "data": {"name": "Y", "quantity": 5, "unit": "g"}}]}}"#,
        ]);
        let resolver = Resolver::new(&s);
        let b = resolver.resolve(&ResolveRequest::new("b")).unwrap();
        let l = resolver.resolve(&ResolveRequest::new("l")).unwrap();
        let ll = resolver.resolve(&ResolveRequest::new("ll")).unwrap();
        assert_eq!(qty(&b.recipe, "x"), 1.0);
        assert_eq!(qty(&l.recipe, "x"), 2.0);
        assert_eq!(qty(&ll.recipe, "x"), 2.0);
        assert_eq!(qty(&ll.recipe, "y"), 5.0);
        assert_eq!(ll.recipe.derived_from, Some(NodeKey::new("l", "1.0.0")));
    }

    #[test]
    fn test_cb012_composition_namespaced_dependency_validates() {
        let s = store(&[
            BROTH,
            r#"{"id": "soup", "version": "1.0.0", "uses": [{"id": "a", "recipe": "broth"}],
                "steps": [{"id": "serve", "text": "Serve", "depends_on": ["a.boil"]}]}"#,
        ]);
        let r = Resolver::new(&s).resolve(&ResolveRequest::new("soup")).unwrap();
        assert_eq!(step_ids(&r.recipe), vec!["serve", "a.roast", "a.boil"]);
        assert!(r.is_valid(), "{:?}", r.violations);
    }

    #[test]
    fn test_cb012_unprefixed_dependency_is_dangling() {
        let s = store(&[
            BROTH,
            r#"{"id": "soup", "version": "1.0.0", "uses": [{"id": "a", "recipe": "broth"}],
                "steps": [{"id": "serve", "text": "Serve", "depends_on": ["boil"]}]}"#,
        ]);
        let r = Resolver::new(&s).resolve(&ResolveRequest::new("soup")).unwrap();
        assert_eq!(r.violations.len(), 1);
        assert_eq!(r.violations[0].kind, ViolationKind::DanglingDependency);
    }

    #[test]
    fn test_cb012_dependency_dangling_reference_not_captured() {
        let s = store(&[
            r#"{"id": "d", "version": "1.0.0",
                "steps": [{"id": "x", "text": "X", "depends_on": ["serve"]}]}"#,
            r#"{"id": "top", "version": "1.0.0", "uses": [{"id": "a", "recipe": "d"}],
                "steps": [{"id": "serve", "text": "Serve"}]}"#,
        ]);
        let r = Resolver::new(&s).resolve(&ResolveRequest::new("top")).unwrap();
        let x = r.recipe.steps.iter().find(|s| s.id == "a.x").unwrap();
        assert_eq!(x.depends_on, vec!["a.serve"]);
        assert_eq!(r.violations.len(), 1);
        assert_eq!(r.violations[0].kind, ViolationKind::DanglingDependency);
        assert!(r.violations[0].message.contains("'a.serve'"));
    }

    #[test]
    fn test_cb012_dependency_defaults_substituted() {
        let s = store(&[
            BROTH,
            r#"{"id": "soup", "version": "1.0.0", "vars": {"minutes": 5},
                "uses": [{"id": "a", "recipe": "broth"}]}"#,
        ]);
        let r = Resolver::new(&s).resolve(&ResolveRequest::new("soup")).unwrap();
        let boil = r.recipe.steps.iter().find(|s| s.id == "a.boil").unwrap();
        assert_eq!(boil.text, "Boil for 90 min");
    }

    #[test]
    fn test_cb012_shared_dependency_resolved_once() {
        let memory = store(&[
            BROTH,
            r#"{"id": "left", "version": "1.0.0", "uses": [{"id": "s", "recipe": "broth"}]}"#,
            r#"{"id": "right", "version": "1.0.0", "uses": [{"id": "s", "recipe": "broth"}]}"#,
            r#"{"id": "feast", "version": "1.0.0", "uses": [
                {"id": "l", "recipe": "left"}, {"id": "r", "recipe": "right"}]}"#,
        ]);
        let lookup = Recording {
            inner: &memory,
            loads: RefCell::new(Vec::new()),
        };
        let resolver = Resolver::new(&lookup);
        let mut cache = ResolutionCache::new();
        let r = resolver
            .resolve_with_cache(&ResolveRequest::new("feast"), &mut cache)
            .unwrap();

        let broth_loads = lookup
            .loads
            .borrow()
            .iter()
            .filter(|k| k.id == "broth")
            .count();
        assert_eq!(broth_loads, 1);
        assert_eq!(cache.len(), 4);

        let via = |prefix: &str| -> Vec<String> {
            r.recipe
                .steps
                .iter()
                .filter_map(|s| s.id.strip_prefix(prefix).map(|_| serde_json::to_string(&s.text).unwrap()))
                .collect()
        };
        assert_eq!(via("l.s."), via("r.s."));
        assert_eq!(via("l.s.").len(), 2);
    }

    #[test]
    fn test_cb012_repeat_resolution_same_fingerprint() {
        let s = store(&[
            BROTH,
            r#"{"id": "soup", "version": "1.0.0", "uses": [{"id": "a", "recipe": "broth"}]}"#,
        ]);
        let resolver = Resolver::new(&s);
        let first = resolver.resolve(&ResolveRequest::new("soup")).unwrap();
        let second = resolver.resolve(&ResolveRequest::new("soup")).unwrap();
        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.recipe, second.recipe);
    }

    #[test]
    fn test_cb012_yield_scaling() {
        let s = store(&[r#"{"id": "pasta", "version": "1.0.0",
            "yield": {"amount": 4, "unit": "servings"},
            "ingredients": [{"id": "pasta", "name": "Pasta", "quantity": 200, "unit": "g"}]}"#]);
        let resolver = Resolver::new(&s);
        let request = |amount: f64, unit: &str| {
            ResolveRequest::new("pasta").with_scale(ScaleRequest {
                yield_: Some(RequestedYield {
                    amount,
                    unit: Some(unit.to_string()),
                }),
                ..Default::default()
            })
        };
        let r = resolver.resolve(&request(8.0, "servings")).unwrap();
        assert_eq!(qty(&r.recipe, "pasta"), 400.0);
        let err = resolver.resolve(&request(4.0, "cups")).unwrap_err();
        assert!(matches!(err, ResolveError::IncompatibleYieldUnit { .. }));
    }

    #[test]
    fn test_cb012_cycle_fails_before_merge() {
        let s = store(&[
            r#"{"id": "x", "version": "1.0.0", "derives_from": {"id": "y",
                "ingredient_patches": [{"op": "remove", "id": "nothing"}]}}"#,
            r#"{"id": "y", "version": "1.0.0", "derives_from": {"id": "x"}}"#,
        ]);
        let err = Resolver::new(&s).resolve(&ResolveRequest::new("x")).unwrap_err();
        assert!(matches!(err, ResolveError::CyclicDependency { .. }));
    }

    #[test]
    fn test_cb012_patch_errors_propagate() {
        let s = store(&[
            r#"{"id": "b", "version": "1.0.0",
                "ingredients": [{"id": "x", "name": "X", "quantity": 1, "unit": "g"}]}"#,
            r#"{"id": "dup", "version": "1.0.0", "derives_from": {"id": "b",
                "ingredient_patches": [{"op": "add", "id": "x", "data": {"name": "X"}}]}}"#,
            r#"{"id": "gone", "version": "1.0.0", "derives_from": {"id": "b",
                "ingredient_patches": [{"op": "remove", "id": "z"}]}}"#,
        ]);
        let resolver = Resolver::new(&s);
        assert!(matches!(
            resolver.resolve(&ResolveRequest::new("dup")),
            Err(ResolveError::DuplicateIdentifier { .. })
        ));
        assert!(matches!(
            resolver.resolve(&ResolveRequest::new("gone")),
            Err(ResolveError::PatchTargetNotFound { .. })
        ));
    }

    #[test]
    fn test_cb012_inherited_composition_patchable() {
        let s = store(&[
            BROTH,
            r#"{"id": "soup", "version": "1.0.0", "uses": [{"id": "a", "recipe": "broth"}]}"#,
            r#"{"id": "quick", "version": "1.0.0", "derives_from": {"id": "soup",
                "step_patches": [{"op": "replace", "id": "a.boil",
                    "data": {"text": "Boil for 20 min", "depends_on": ["a.roast"]}}]}}"#,
        ]);
        let r = Resolver::new(&s).resolve(&ResolveRequest::new("quick")).unwrap();
        assert_eq!(r.recipe.aliases, vec!["a"]);
        let boil = r.recipe.steps.iter().find(|s| s.id == "a.boil").unwrap();
        assert_eq!(boil.text, "Boil for 20 min");
        assert!(r.is_valid(), "{:?}", r.violations);
    }

    #[test]
    fn test_cb012_version_selection() {
        let s = store(&[
            r#"{"id": "t", "version": "1.0.0"}"#,
            r#"{"id": "t", "version": "1.4.0"}"#,
            r#"{"id": "t", "version": "2.0.0"}"#,
        ]);
        let resolver = Resolver::new(&s);
        let latest = resolver.resolve(&ResolveRequest::new("t")).unwrap();
        assert_eq!(latest.recipe.version, "2.0.0");
        let caret = resolver
            .resolve(&ResolveRequest::new("t").with_constraint("^1.0"))
            .unwrap();
        assert_eq!(caret.recipe.version, "1.4.0");
        let exact = resolver
            .resolve(&ResolveRequest::new("t").with_version("1.0.0"))
            .unwrap();
        assert_eq!(exact.recipe.version, "1.0.0");
        assert!(matches!(
            resolver.resolve(&ResolveRequest::new("t").with_version("3.0.0")),
            Err(ResolveError::UnknownVersion { .. })
        ));
        assert!(matches!(
            resolver.resolve(&ResolveRequest::new("nope")),
            Err(ResolveError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_cb012_batch_one_invalid() {
        let s = store(&[
            BROTH,
            r#"{"id": "soup", "version": "1.0.0", "uses": [{"id": "a", "recipe": "broth"}]}"#,
            r#"{"id": "toast", "version": "1.0.0",
                "ingredients": [{"id": "bread", "name": "Bread", "quantity": 2, "unit": "slice"}]}"#,
            r#"{"id": "toast", "version": "1.1.0",
                "ingredients": [{"id": "bread", "name": "Bread", "quantity": 3, "unit": "slice"}]}"#,
            r#"{"id": "broken", "version": "1.0.0",
                "steps": [{"id": "a", "text": "A", "depends_on": ["missing"]}]}"#,
        ]);
        let report = Resolver::new(&s).validate_all().unwrap();
        assert_eq!(report.entries.len(), 5);
        assert_eq!(report.valid_count(), 4);
        let failures: Vec<&BatchEntry> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].key, NodeKey::new("broken", "1.0.0"));
        assert_eq!(report.violations().count(), 1);
        assert!(!report.is_success());
    }

    #[test]
    fn test_cb012_batch_collects_hard_failures() {
        let s = store(&[
            r#"{"id": "ok", "version": "1.0.0"}"#,
            r#"{"id": "orphan", "version": "1.0.0", "derives_from": {"id": "ghost"}}"#,
        ]);
        let report = Resolver::new(&s).validate_all().unwrap();
        assert_eq!(report.entries.len(), 2);
        let failures: Vec<&BatchEntry> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            failures[0].outcome,
            Outcome::Failed(ResolveError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_cb012_validate_recipe_oldest_first() {
        let s = store(&[
            r#"{"id": "t", "version": "1.10.0"}"#,
            r#"{"id": "t", "version": "1.9.0"}"#,
        ]);
        let report = Resolver::new(&s).validate_recipe("t").unwrap();
        let versions: Vec<&str> = report.entries.iter().map(|e| e.key.version.as_str()).collect();
        assert_eq!(versions, vec!["1.9.0", "1.10.0"]);
    }
}
