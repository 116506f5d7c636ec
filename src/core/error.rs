//! CB-002: Resolution errors.
//!
//! Every failure is deterministic for a given input, so there is no
//! transient/fatal split: any variant stops the enclosing resolution.

use thiserror::Error;

/// Result type for resolution operations
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors that abort a resolution request
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The lookup has no versions at all for this recipe
    #[error("unknown recipe '{id}'")]
    UnknownEntity { id: String },

    /// The recipe exists but not at this version
    #[error("unknown version {version} of recipe '{id}'")]
    UnknownVersion { id: String, version: String },

    /// No known version satisfies the constraint
    #[error("no version of '{id}' matches '{constraint}' (known: {known})")]
    NoMatchingVersion {
        id: String,
        constraint: String,
        known: String,
    },

    /// Malformed constraint expression
    #[error("invalid version constraint '{constraint}': {reason}")]
    InvalidConstraint { constraint: String, reason: String },

    /// A stored version string does not parse
    #[error("recipe '{id}' has invalid version '{version}': {reason}")]
    InvalidVersion {
        id: String,
        version: String,
        reason: String,
    },

    /// A recipe derives from or uses itself, directly or transitively
    #[error("dependency cycle detected: {}", members.join(" -> "))]
    CyclicDependency { members: Vec<String> },

    /// `add` patch, or alias import, collides with an existing identifier
    #[error("{entity}: duplicate {kind} id '{id}'")]
    DuplicateIdentifier {
        entity: String,
        kind: &'static str,
        id: String,
    },

    /// `replace`/`remove` names an identifier that does not exist
    #[error("{entity}: {op} patch targets unknown {kind} '{id}'")]
    PatchTargetNotFound {
        entity: String,
        kind: &'static str,
        op: String,
        id: String,
    },

    /// `include_steps` names a step the dependency does not have
    #[error("{entity}: alias '{alias}' includes unknown step '{step}'")]
    UnknownIncludedStep {
        entity: String,
        alias: String,
        step: String,
    },

    /// Two `uses` entries (or a `uses` entry and an inherited one) share an alias
    #[error("{entity}: duplicate alias '{alias}'")]
    DuplicateAlias { entity: String, alias: String },

    /// An override names a var the recipe does not declare
    #[error("{entity}: unknown variable '{name}'")]
    UnknownVariable { entity: String, name: String },

    /// A placeholder is left without a value after substitution
    #[error("{entity}: unresolved variable '{name}' in {location}")]
    UnresolvedVariable {
        entity: String,
        name: String,
        location: String,
    },

    /// Requested yield unit differs from the canonical one
    #[error("{entity}: cannot scale {canonical} to {requested} (no unit conversion)")]
    IncompatibleYieldUnit {
        entity: String,
        canonical: String,
        requested: String,
    },

    /// Scaling requested on a recipe whose yield cannot anchor it
    #[error("{entity}: cannot scale yield: {reason}")]
    UnscalableYield { entity: String, reason: String },

    /// A stored document failed to parse or failed load-time checks
    #[error("cannot load {id}@{version}: {reason}")]
    Load {
        id: String,
        version: String,
        reason: String,
    },

    /// Project configuration could not be read
    #[error("config error: {0}")]
    Config(String),

    /// IO error from a file-backed lookup
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
