//! CB-007: Composition: splice dependencies in under their aliases.
//!
//! Imported steps are namespaced as `alias.step` and their `depends_on`
//! edges are rewritten to the same namespace, so the dependency's own
//! ordering survives the import. Edges to steps left out by
//! `include_steps` are dropped. Ingredients stay with the
//! dependency unless the `uses` entry exposes them, in which case they are
//! surfaced as `alias.ingredient` with `from: alias`.

use super::error::{ResolveError, Result};
use super::types::{ResolvedRecipe, Step, UseRef};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Namespaced identifier for an imported entry.
pub fn namespaced(alias: &str, id: &str) -> String {
    format!("{}.{}", alias, id)
}

/// Splice every `uses` entry, in declaration order, into `recipe`.
///
/// `deps` maps each alias to the dependency's resolved form.
pub fn compose(
    mut recipe: ResolvedRecipe,
    uses: &[UseRef],
    deps: &HashMap<String, ResolvedRecipe>,
) -> Result<ResolvedRecipe> {
    let entity = recipe.key().to_string();

    for use_ref in uses {
        let alias = use_ref.id.as_str();
        if recipe.aliases.iter().any(|a| a == alias) {
            return Err(ResolveError::DuplicateAlias {
                entity,
                alias: alias.to_string(),
            });
        }
        let dep = deps.get(alias).ok_or_else(|| ResolveError::UnknownEntity {
            id: use_ref.recipe.clone(),
        })?;

        let selected = select_steps(&entity, use_ref, dep)?;
        let imported: HashSet<&str> = selected.iter().map(|s| s.id.as_str()).collect();
        let omitted: HashSet<&str> = dep
            .steps
            .iter()
            .map(|s| s.id.as_str())
            .filter(|id| !imported.contains(id))
            .collect();

        for step in &selected {
            let mut s = (*step).clone();
            s.id = namespaced(alias, &step.id);
            // unknown targets are namespaced too, so they stay dangling
            s.depends_on = step
                .depends_on
                .iter()
                .filter(|d| !omitted.contains(d.as_str()))
                .map(|d| namespaced(alias, d))
                .collect();
            recipe.steps.push(s);
        }

        let mut exposed = 0;
        if use_ref.expose_ingredients {
            for ingredient in &dep.ingredients {
                let mut ing = ingredient.clone();
                ing.id = namespaced(alias, &ingredient.id);
                ing.from = Some(alias.to_string());
                recipe.ingredients.push(ing);
                exposed += 1;
            }
        }

        debug!(
            recipe = %entity,
            alias,
            dependency = %dep.key(),
            steps = selected.len(),
            ingredients = exposed,
            "spliced dependency"
        );
        recipe.aliases.push(alias.to_string());
    }

    Ok(recipe)
}

/// The dependency's steps to import, in the dependency's own order.
fn select_steps<'a>(entity: &str, use_ref: &UseRef, dep: &'a ResolvedRecipe) -> Result<Vec<&'a Step>> {
    let Some(include) = &use_ref.include_steps else {
        return Ok(dep.steps.iter().collect());
    };
    for wanted in include {
        if !dep.steps.iter().any(|s| &s.id == wanted) {
            return Err(ResolveError::UnknownIncludedStep {
                entity: entity.to_string(),
                alias: use_ref.id.clone(),
                step: wanted.clone(),
            });
        }
    }
    Ok(dep
        .steps
        .iter()
        .filter(|s| include.contains(&s.id))
        .collect())
}
