//! CB-006: Derivation merge: apply a leaf's patches over its resolved base.
//!
//! Patches are keyed by identifier only and applied strictly in listed order,
//! so a later patch may target an id an earlier one introduced. A chain of
//! depth N is merged N times, ancestor first, each step feeding the next.

use super::error::{ResolveError, Result};
use super::types::{Keyed, Patch, RecipeDoc, ResolvedRecipe};
use tracing::debug;

/// Apply an ordered patch list to `items`.
///
/// - `add`: id must be new, entry is appended
/// - `replace`: id must exist, entry is substituted wholesale (id kept)
/// - `remove`: id must exist, entry is dropped; references to it are left
///   for validation to report
pub fn apply_patches<T: Keyed + Clone>(
    entity: &str,
    items: &mut Vec<T>,
    patches: &[Patch<T>],
) -> Result<()> {
    for patch in patches {
        let target = patch.target();
        let pos = items.iter().position(|item| item.key() == target);
        match (patch, pos) {
            (Patch::Add { id, data }, None) => {
                let mut entry = data.clone();
                entry.set_key(id.clone());
                items.push(entry);
            }
            (Patch::Add { id, .. }, Some(_)) => {
                return Err(ResolveError::DuplicateIdentifier {
                    entity: entity.to_string(),
                    kind: T::KIND,
                    id: id.clone(),
                });
            }
            (Patch::Replace { id, data }, Some(p)) => {
                let mut entry = data.clone();
                entry.set_key(id.clone());
                items[p] = entry;
            }
            (Patch::Remove { .. }, Some(p)) => {
                items.remove(p);
            }
            (_, None) => {
                return Err(ResolveError::PatchTargetNotFound {
                    entity: entity.to_string(),
                    kind: T::KIND,
                    op: patch.op().to_string(),
                    id: target.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Overlay entries a leaf declares directly: replace in place, else append.
fn upsert<T: Keyed + Clone>(items: &mut Vec<T>, own: &[T]) {
    for entry in own {
        match items.iter().position(|item| item.key() == entry.key()) {
            Some(p) => items[p] = entry.clone(),
            None => items.push(entry.clone()),
        }
    }
}

/// Produce the leaf's pre-composition form from its resolved base.
pub fn merge(base: &ResolvedRecipe, leaf: &RecipeDoc) -> Result<ResolvedRecipe> {
    let entity = format!("{}@{}", leaf.id, leaf.version);

    let mut ingredients = base.ingredients.clone();
    let mut steps = base.steps.clone();
    if let Some(derivation) = &leaf.derives_from {
        apply_patches(&entity, &mut ingredients, &derivation.ingredient_patches)?;
        apply_patches(&entity, &mut steps, &derivation.step_patches)?;
        debug!(
            recipe = %entity,
            base = %base.key(),
            ingredient_patches = derivation.ingredient_patches.len(),
            step_patches = derivation.step_patches.len(),
            "applied derivation patches"
        );
    }
    upsert(&mut ingredients, &leaf.ingredients);
    upsert(&mut steps, &leaf.steps);

    let mut vars = base.vars.clone();
    for (name, value) in &leaf.vars {
        vars.insert(name.clone(), value.clone());
    }

    Ok(ResolvedRecipe {
        id: leaf.id.clone(),
        version: leaf.version.clone(),
        meta: base.meta.overlay(&leaf.meta),
        vars,
        ingredients,
        steps,
        aliases: base.aliases.clone(),
        derived_from: Some(base.key()),
    })
}
