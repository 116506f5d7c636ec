//! CB-001: Recipe document types and the resolved form.
//!
//! Raw documents are loosely authored JSON; everything here is typed so the
//! merge pipeline only ever works on known shapes. All types derive
//! Serialize/Deserialize for JSON roundtripping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Raw recipe documents
// ============================================================================

/// A single persisted recipe version, exactly as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDoc {
    /// Recipe slug (unique among recipes)
    pub id: String,

    /// Semantic version of this document
    pub version: String,

    /// Scalar metadata (name, lineage, yield, free-form fields)
    #[serde(flatten)]
    pub meta: Metadata,

    /// Runtime-overridable parameters
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub vars: IndexMap<String, serde_json::Value>,

    /// Own ingredients (for a derived recipe: upserted after patches)
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,

    /// Own steps (for a derived recipe: upserted after patches)
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Base recipe this one inherits from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derives_from: Option<DerivationRef>,

    /// Composed dependencies, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uses: Vec<UseRef>,
}

/// Scalar metadata. Every field present on a leaf overrides its base.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Stable identity across versions; changes only on fork
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage_id: Option<String>,

    /// Major conceptual generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// Canonical production quantity
    #[serde(rename = "yield", default, skip_serializing_if = "Option::is_none")]
    pub yield_: Option<Measure>,

    /// Any other scalar fields, kept in authored order
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Metadata {
    /// Overlay `leaf` on top of `self`: present leaf fields win.
    pub fn overlay(&self, leaf: &Metadata) -> Metadata {
        let mut extra = self.extra.clone();
        for (k, v) in &leaf.extra {
            extra.insert(k.clone(), v.clone());
        }
        Metadata {
            lineage_id: leaf.lineage_id.clone().or_else(|| self.lineage_id.clone()),
            iteration: leaf.iteration.or(self.iteration),
            name: leaf.name.clone().or_else(|| self.name.clone()),
            description: leaf.description.clone().or_else(|| self.description.clone()),
            authors: leaf.authors.clone().or_else(|| self.authors.clone()),
            tags: leaf.tags.clone().or_else(|| self.tags.clone()),
            yield_: leaf.yield_.clone().or_else(|| self.yield_.clone()),
            extra,
        }
    }
}

/// An amount with a unit, used for yields and step durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub amount: f64,
    pub unit: String,
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit)
    }
}

/// Ingredient quantity: a number, or text carrying `{{vars.NAME}}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Amount(f64),
    Expr(String),
}

impl Quantity {
    /// Numeric value, if this quantity is (or parses as) a number.
    pub fn as_amount(&self) -> Option<f64> {
        match self {
            Self::Amount(a) => Some(*a),
            Self::Expr(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(a) => write!(f, "{}", a),
            Self::Expr(s) => write!(f, "{}", s),
        }
    }
}

/// A single ingredient line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Merge key; unique within a resolved recipe
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,

    #[serde(default)]
    pub unit: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Alias of the composed dependency this ingredient came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// A single preparation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Merge key; unique within a resolved recipe
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Measure>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,

    /// Declared precedence: step ids that come before this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// Entries addressable by identifier in a patch list.
pub trait Keyed {
    /// Human-readable kind, used in diagnostics.
    const KIND: &'static str;

    fn key(&self) -> &str;
    fn set_key(&mut self, key: String);
}

impl Keyed for Ingredient {
    const KIND: &'static str = "ingredient";

    fn key(&self) -> &str {
        &self.id
    }

    fn set_key(&mut self, key: String) {
        self.id = key;
    }
}

impl Keyed for Step {
    const KIND: &'static str = "step";

    fn key(&self) -> &str {
        &self.id
    }

    fn set_key(&mut self, key: String) {
        self.id = key;
    }
}

// ============================================================================
// Derivation and composition references
// ============================================================================

/// `derives_from`: the base recipe plus the ordered patch lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivationRef {
    /// Base recipe slug
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingredient_patches: Vec<Patch<Ingredient>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub step_patches: Vec<Patch<Step>>,
}

/// A patch against an identified ingredient or step.
///
/// `replace` substitutes the whole entry; only the identifier survives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Patch<T> {
    Add { id: String, data: T },
    Replace { id: String, data: T },
    Remove { id: String },
}

impl<T> Patch<T> {
    pub fn target(&self) -> &str {
        match self {
            Self::Add { id, .. } | Self::Replace { id, .. } | Self::Remove { id } => id,
        }
    }

    pub fn op(&self) -> PatchOp {
        match self {
            Self::Add { .. } => PatchOp::Add,
            Self::Replace { .. } => PatchOp::Replace,
            Self::Remove { .. } => PatchOp::Remove,
        }
    }
}

/// Patch operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Replace => write!(f, "replace"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// `uses` entry: a composed dependency imported under an alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseRef {
    /// Local alias; imported step ids become `alias.step`
    pub id: String,

    /// Dependency recipe slug
    pub recipe: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,

    /// Subset of the dependency's steps to import (all when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_steps: Option<Vec<String>>,

    /// Surface the dependency's ingredients with `from: alias`
    #[serde(default)]
    pub expose_ingredients: bool,
}

// ============================================================================
// Graph keys
// ============================================================================

/// A concrete (recipe, version) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub id: String,
    pub version: String,
}

impl NodeKey {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

// ============================================================================
// Resolved form
// ============================================================================

/// The flattened output: patches applied, compositions spliced, identifiers
/// disambiguated, quantities scaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRecipe {
    pub id: String,
    pub version: String,

    #[serde(flatten)]
    pub meta: Metadata,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub vars: IndexMap<String, serde_json::Value>,

    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,

    /// Every alias spliced into this recipe, inherited ones first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// The concrete base version this recipe was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<NodeKey>,
}

impl ResolvedRecipe {
    /// Start a resolved form from a document with no base.
    pub fn from_doc(doc: &RecipeDoc) -> Self {
        Self {
            id: doc.id.clone(),
            version: doc.version.clone(),
            meta: doc.meta.clone(),
            vars: doc.vars.clone(),
            ingredients: doc.ingredients.clone(),
            steps: doc.steps.clone(),
            aliases: Vec::new(),
            derived_from: None,
        }
    }

    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.id.clone(), self.version.clone())
    }
}

// ============================================================================
// Template helper
// ============================================================================

/// Convert a JSON var value to the string spliced into a placeholder.
pub fn json_value_to_string(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
