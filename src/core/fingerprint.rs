//! CB-010: BLAKE3 content fingerprints for resolved recipes.
//!
//! The fingerprint is taken over the compact JSON form, which is stable
//! because every map in the resolved form preserves authored order.

use super::error::Result;
use super::types::ResolvedRecipe;

/// Hash a string. Returns `"blake3:{hex}"`.
pub fn hash_string(s: &str) -> String {
    format!("blake3:{}", blake3::hash(s.as_bytes()).to_hex())
}

/// Hash several components in order, separated so `["ab", "c"]` and
/// `["a", "bc"]` differ.
pub fn composite_hash(components: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in components {
        hasher.update(c.as_bytes());
        hasher.update(b"\0");
    }
    format!("blake3:{}", hasher.finalize().to_hex())
}

/// Fingerprint of a resolved recipe.
pub fn fingerprint(recipe: &ResolvedRecipe) -> Result<String> {
    let json = serde_json::to_string(recipe)?;
    Ok(hash_string(&json))
}
