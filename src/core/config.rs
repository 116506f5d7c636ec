//! CB-011: Project configuration (`cookbook.yaml`).
//!
//! Every field is optional. A missing file means defaults.

use super::error::{ResolveError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default project file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "cookbook.yaml";

/// Top-level `cookbook.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CookbookConfig {
    /// Root of the recipe file tree
    #[serde(default = "default_recipes_dir")]
    pub recipes_dir: PathBuf,

    /// Tracing filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub policy: Policy,
}

/// What counts as fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    /// Refuse to emit a resolved recipe that has validation findings
    #[serde(default = "default_true")]
    pub warnings_fatal: bool,
}

impl Default for CookbookConfig {
    fn default() -> Self {
        Self {
            recipes_dir: default_recipes_dir(),
            log_level: default_log_level(),
            policy: Policy::default(),
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            warnings_fatal: true,
        }
    }
}

fn default_recipes_dir() -> PathBuf {
    PathBuf::from("recipes")
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

/// Parse a config from a YAML string.
pub fn parse_config(yaml: &str) -> Result<CookbookConfig> {
    // serde_yaml_ng maps an empty document to unit, not an empty mapping
    if yaml.trim().is_empty() {
        return Ok(CookbookConfig::default());
    }
    serde_yaml_ng::from_str(yaml).map_err(|e| ResolveError::Config(format!("YAML parse error: {}", e)))
}

/// Load a config file. A missing file yields defaults.
pub fn load_config(path: &Path) -> Result<CookbookConfig> {
    if !path.exists() {
        return Ok(CookbookConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ResolveError::Config(format!("failed to read {}: {}", path.display(), e)))?;
    parse_config(&content)
}
