//! CB-004: Recipe lookup, the read-only capability the engine resolves against.
//!
//! The engine only ever calls [`RecipeLookup`]. Two implementations ship:
//! an in-memory store and a file tree of JSON documents:
//!
//! ```text
//! recipes/
//!   ragu/
//!     recipe.json                 current version
//!     versions/1.0.0/recipe.json  archived versions
//! ```
//!
//! Documents are checked at load time: the stored `id`/`version` must match
//! the key they were loaded under and the version must parse.

use super::error::{ResolveError, Result};
use super::types::RecipeDoc;
use super::version::parse_version;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const RECIPE_FILE: &str = "recipe.json";
const VERSIONS_DIR: &str = "versions";

/// Read-only access to persisted recipe versions.
pub trait RecipeLookup {
    /// All recipe slugs, sorted.
    fn list_recipes(&self) -> Result<Vec<String>>;

    /// All known versions of a recipe. Empty when the recipe is unknown.
    fn list_versions(&self, id: &str) -> Result<Vec<String>>;

    /// Load one version of a recipe.
    fn load(&self, id: &str, version: &str) -> Result<RecipeDoc>;
}

/// Load-time checks shared by every store.
fn check_doc(doc: &RecipeDoc, id: &str, version: &str) -> Result<()> {
    let fail = |reason: String| ResolveError::Load {
        id: id.to_string(),
        version: version.to_string(),
        reason,
    };
    if doc.id != id {
        return Err(fail(format!("document declares id '{}'", doc.id)));
    }
    if doc.version != version {
        return Err(fail(format!("document declares version '{}'", doc.version)));
    }
    parse_version(&doc.version).map_err(|reason| ResolveError::InvalidVersion {
        id: id.to_string(),
        version: version.to_string(),
        reason,
    })?;
    Ok(())
}

// ============================================================================
// In-memory store
// ============================================================================

/// Recipes held in memory, keyed by slug then version.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    recipes: BTreeMap<String, BTreeMap<String, RecipeDoc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, replacing any existing one at the same (id, version).
    pub fn insert(&mut self, doc: RecipeDoc) -> Result<()> {
        check_doc(&doc, &doc.id, &doc.version)?;
        self.recipes
            .entry(doc.id.clone())
            .or_default()
            .insert(doc.version.clone(), doc);
        Ok(())
    }

    /// Parse and add a JSON document.
    pub fn insert_json(&mut self, json: &str) -> Result<()> {
        let doc: RecipeDoc = serde_json::from_str(json)?;
        self.insert(doc)
    }

    pub fn from_docs(docs: impl IntoIterator<Item = RecipeDoc>) -> Result<Self> {
        let mut store = Self::new();
        for doc in docs {
            store.insert(doc)?;
        }
        Ok(store)
    }
}

impl RecipeLookup for MemoryStore {
    fn list_recipes(&self) -> Result<Vec<String>> {
        Ok(self.recipes.keys().cloned().collect())
    }

    fn list_versions(&self, id: &str) -> Result<Vec<String>> {
        Ok(self
            .recipes
            .get(id)
            .map(|versions| versions.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn load(&self, id: &str, version: &str) -> Result<RecipeDoc> {
        let versions = self
            .recipes
            .get(id)
            .ok_or_else(|| ResolveError::UnknownEntity { id: id.to_string() })?;
        versions
            .get(version)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownVersion {
                id: id.to_string(),
                version: version.to_string(),
            })
    }
}

// ============================================================================
// Directory store
// ============================================================================

/// Recipes stored as a file tree of JSON documents.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the current version document of a recipe.
    pub fn current_path(&self, id: &str) -> PathBuf {
        self.root.join(id).join(RECIPE_FILE)
    }

    /// Path of an archived version document.
    pub fn version_path(&self, id: &str, version: &str) -> PathBuf {
        self.root
            .join(id)
            .join(VERSIONS_DIR)
            .join(version)
            .join(RECIPE_FILE)
    }

    fn read_doc(&self, path: &Path, id: &str, version: &str) -> Result<RecipeDoc> {
        let content = std::fs::read_to_string(path).map_err(|e| ResolveError::Load {
            id: id.to_string(),
            version: version.to_string(),
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        serde_json::from_str(&content).map_err(|e| ResolveError::Load {
            id: id.to_string(),
            version: version.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })
    }

    /// Version declared by the current document, if there is one.
    fn current_version(&self, id: &str) -> Result<Option<String>> {
        let path = self.current_path(id);
        if !path.is_file() {
            return Ok(None);
        }
        let doc = self.read_doc(&path, id, "current")?;
        Ok(Some(doc.version))
    }
}

/// Slugs and version directory names are single path components.
fn is_slug(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\'])
}

/// Sorted names of subdirectories of `dir`.
fn subdirs(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

impl RecipeLookup for DirStore {
    fn list_recipes(&self) -> Result<Vec<String>> {
        let mut slugs = Vec::new();
        for name in subdirs(&self.root)? {
            let dir = self.root.join(&name);
            if dir.join(RECIPE_FILE).is_file() || dir.join(VERSIONS_DIR).is_dir() {
                slugs.push(name);
            }
        }
        Ok(slugs)
    }

    fn list_versions(&self, id: &str) -> Result<Vec<String>> {
        if !is_slug(id) || !self.root.join(id).is_dir() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        let archive = self.root.join(id).join(VERSIONS_DIR);
        if archive.is_dir() {
            for name in subdirs(&archive)? {
                if archive.join(&name).join(RECIPE_FILE).is_file() {
                    versions.push(name);
                }
            }
        }
        if let Some(current) = self.current_version(id)? {
            if !versions.contains(&current) {
                versions.push(current);
            }
        }
        debug!(recipe = id, count = versions.len(), "listed versions");
        Ok(versions)
    }

    fn load(&self, id: &str, version: &str) -> Result<RecipeDoc> {
        if !is_slug(id) || !self.root.join(id).is_dir() {
            return Err(ResolveError::UnknownEntity { id: id.to_string() });
        }
        if !is_slug(version) {
            return Err(ResolveError::UnknownVersion {
                id: id.to_string(),
                version: version.to_string(),
            });
        }
        let archived = self.version_path(id, version);
        let doc = if archived.is_file() {
            self.read_doc(&archived, id, version)?
        } else if self.current_version(id)?.as_deref() == Some(version) {
            self.read_doc(&self.current_path(id), id, version)?
        } else {
            return Err(ResolveError::UnknownVersion {
                id: id.to_string(),
                version: version.to_string(),
            });
        };
        check_doc(&doc, id, version)?;
        debug!(recipe = id, version, "loaded recipe");
        Ok(doc)
    }
}
