//! CB-008: Parameter substitution and yield scaling.
//!
//! Resolves `{{vars.NAME}}` placeholders in ingredient names, notes and
//! quantities and in step text, then scales every numeric ingredient quantity
//! by `requested / canonical`. Scaling always starts from the unscaled
//! composed form, never from an already-scaled one.

use super::error::{ResolveError, Result};
use super::types::{json_value_to_string, Measure, Quantity, ResolvedRecipe};
use indexmap::IndexMap;
use tracing::debug;

const PLACEHOLDER_OPEN: &str = "{{vars.";
const PLACEHOLDER_CLOSE: &str = "}}";

/// A target yield. No unit means "the recipe's canonical unit".
#[derive(Debug, Clone, PartialEq)]
pub struct RequestedYield {
    pub amount: f64,
    pub unit: Option<String>,
}

/// Runtime parameters for one resolution request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaleRequest {
    pub yield_: Option<RequestedYield>,
    pub vars: IndexMap<String, serde_json::Value>,
}

/// Replace every `{{vars.NAME}}` in `template`. On failure, returns the name
/// of the first placeholder without a value.
pub fn substitute(
    template: &str,
    vars: &IndexMap<String, serde_json::Value>,
) -> std::result::Result<String, String> {
    let mut result = template.to_string();
    let mut start = 0;

    while let Some(open) = result[start..].find(PLACEHOLDER_OPEN) {
        let open = start + open;
        let name_start = open + PLACEHOLDER_OPEN.len();
        let close = result[name_start..]
            .find(PLACEHOLDER_CLOSE)
            .ok_or_else(|| result[name_start..].trim().to_string())?;
        let close = name_start + close;
        let name = result[name_start..close].trim().to_string();

        let value = vars.get(&name).map(json_value_to_string).ok_or(name)?;

        result.replace_range(open..close + PLACEHOLDER_CLOSE.len(), &value);
        start = open + value.len();
    }

    Ok(result)
}

/// Only quantities written with a placeholder are rewritten; a literal
/// string quantity is left as authored.
fn has_placeholder(q: &Quantity) -> bool {
    matches!(q, Quantity::Expr(expr) if expr.contains(PLACEHOLDER_OPEN))
}

/// Substitute the recipe's own vars into every placeholder-bearing field.
pub fn substitute_vars(mut recipe: ResolvedRecipe) -> Result<ResolvedRecipe> {
    let entity = recipe.key().to_string();
    let vars = recipe.vars.clone();
    let unresolved = |location: String| {
        let entity = entity.clone();
        move |name: String| ResolveError::UnresolvedVariable {
            entity,
            name,
            location,
        }
    };

    for ing in &mut recipe.ingredients {
        ing.name = substitute(&ing.name, &vars)
            .map_err(unresolved(format!("ingredient '{}' name", ing.id)))?;
        if let Some(note) = &ing.note {
            ing.note = Some(
                substitute(note, &vars)
                    .map_err(unresolved(format!("ingredient '{}' note", ing.id)))?,
            );
        }
        if let Some(Quantity::Expr(expr)) = ing.quantity.as_ref().filter(|q| has_placeholder(q)) {
            let text = substitute(expr, &vars)
                .map_err(unresolved(format!("ingredient '{}' quantity", ing.id)))?;
            ing.quantity = Some(match text.trim().parse::<f64>() {
                Ok(amount) => Quantity::Amount(amount),
                Err(_) => Quantity::Expr(text),
            });
        }
    }
    for step in &mut recipe.steps {
        step.text = substitute(&step.text, &vars)
            .map_err(unresolved(format!("step '{}' text", step.id)))?;
    }

    Ok(recipe)
}

/// Apply var overrides and the requested yield to a composed recipe.
pub fn scale(mut recipe: ResolvedRecipe, request: &ScaleRequest) -> Result<ResolvedRecipe> {
    let entity = recipe.key().to_string();

    for (name, value) in &request.vars {
        match recipe.vars.get_mut(name) {
            Some(slot) => *slot = value.clone(),
            None => {
                return Err(ResolveError::UnknownVariable {
                    entity,
                    name: name.clone(),
                })
            }
        }
    }
    let mut recipe = substitute_vars(recipe)?;

    let Some(requested) = &request.yield_ else {
        return Ok(recipe);
    };
    let canonical = recipe
        .meta
        .yield_
        .clone()
        .ok_or_else(|| ResolveError::UnscalableYield {
            entity: entity.clone(),
            reason: "recipe declares no yield".to_string(),
        })?;
    let unit = requested.unit.as_deref().unwrap_or(&canonical.unit);
    if unit != canonical.unit {
        return Err(ResolveError::IncompatibleYieldUnit {
            entity,
            canonical: canonical.to_string(),
            requested: format!("{} {}", requested.amount, unit),
        });
    }
    if !(canonical.amount > 0.0 && canonical.amount.is_finite()) {
        return Err(ResolveError::UnscalableYield {
            entity,
            reason: format!("canonical yield {} is not positive", canonical),
        });
    }
    if !(requested.amount >= 0.0 && requested.amount.is_finite()) {
        return Err(ResolveError::UnscalableYield {
            entity,
            reason: format!("requested amount {} is not a non-negative number", requested.amount),
        });
    }

    for ing in &mut recipe.ingredients {
        if let Some(q) = ing.quantity.as_ref().and_then(Quantity::as_amount) {
            ing.quantity = Some(Quantity::Amount(q * requested.amount / canonical.amount));
        }
    }
    debug!(
        recipe = %entity,
        from = %canonical,
        to = requested.amount,
        "scaled yield"
    );
    recipe.meta.yield_ = Some(Measure {
        amount: requested.amount,
        unit: canonical.unit,
    });

    Ok(recipe)
}
