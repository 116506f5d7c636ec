//! CB-009: Structural validation of a resolved recipe.
//!
//! Checks run independently and every finding is collected, so a caller
//! sees all problems in one pass:
//! - ingredient and step ids are present and unique
//! - `depends_on` targets exist
//! - ingredient `from` names a spliced alias
//! - step ordering is acyclic
//! - quantities, times and yield are non-negative numbers with units
//!
//! Findings are advisory; whether any is fatal is up to the caller.

use super::types::{Measure, ResolvedRecipe, Step};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Category of a structural finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingIdentifier,
    DuplicateIngredient,
    DuplicateStep,
    DanglingDependency,
    UnknownAlias,
    StepCycle,
    InvalidQuantity,
    InvalidMeasure,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIdentifier => write!(f, "missing-id"),
            Self::DuplicateIngredient => write!(f, "duplicate-ingredient"),
            Self::DuplicateStep => write!(f, "duplicate-step"),
            Self::DanglingDependency => write!(f, "dangling-dependency"),
            Self::UnknownAlias => write!(f, "unknown-alias"),
            Self::StepCycle => write!(f, "step-cycle"),
            Self::InvalidQuantity => write!(f, "invalid-quantity"),
            Self::InvalidMeasure => write!(f, "invalid-measure"),
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// `id@version` of the recipe the finding belongs to
    pub entity: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

struct Findings {
    entity: String,
    list: Vec<Violation>,
}

impl Findings {
    fn push(&mut self, kind: ViolationKind, message: String) {
        self.list.push(Violation {
            entity: self.entity.clone(),
            kind,
            message,
        });
    }
}

/// Validate a resolved recipe. Returns every finding (empty = valid).
pub fn validate(recipe: &ResolvedRecipe) -> Vec<Violation> {
    let mut findings = Findings {
        entity: recipe.key().to_string(),
        list: Vec::new(),
    };

    check_unique(
        &mut findings,
        recipe.ingredients.iter().map(|i| i.id.as_str()),
        "ingredient",
        ViolationKind::DuplicateIngredient,
    );
    check_unique(
        &mut findings,
        recipe.steps.iter().map(|s| s.id.as_str()),
        "step",
        ViolationKind::DuplicateStep,
    );
    check_dependencies(&mut findings, &recipe.steps);
    check_aliases(&mut findings, recipe);
    check_step_cycles(&mut findings, &recipe.steps);
    check_quantities(&mut findings, recipe);

    findings.list
}

fn check_unique<'a>(
    findings: &mut Findings,
    ids: impl Iterator<Item = &'a str>,
    kind: &str,
    violation: ViolationKind,
) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for (pos, id) in ids.enumerate() {
        if id.is_empty() {
            findings.push(
                ViolationKind::MissingIdentifier,
                format!("{} #{} has no id", kind, pos + 1),
            );
            continue;
        }
        if !seen.insert(id) && reported.insert(id) {
            findings.push(violation, format!("duplicate {} id '{}'", kind, id));
        }
    }
}

fn check_dependencies(findings: &mut Findings, steps: &[Step]) {
    let ids: HashSet<&str> = steps.iter().map(|s| s.id.as_str()).collect();
    for step in steps {
        for dep in &step.depends_on {
            if !ids.contains(dep.as_str()) {
                findings.push(
                    ViolationKind::DanglingDependency,
                    format!("step '{}' depends on unknown step '{}'", step.id, dep),
                );
            }
            if dep == &step.id {
                findings.push(
                    ViolationKind::StepCycle,
                    format!("step '{}' depends on itself", step.id),
                );
            }
        }
    }
}

fn check_aliases(findings: &mut Findings, recipe: &ResolvedRecipe) {
    for ing in &recipe.ingredients {
        if let Some(alias) = &ing.from {
            if !recipe.aliases.contains(alias) {
                findings.push(
                    ViolationKind::UnknownAlias,
                    format!("ingredient '{}' is attributed to unknown alias '{}'", ing.id, alias),
                );
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first search over `depends_on`; every back edge is one cycle.
/// Self-edges are reported by `check_dependencies`.
fn check_step_cycles(findings: &mut Findings, steps: &[Step]) {
    let graph: HashMap<&str, Vec<&str>> = steps
        .iter()
        .map(|s| {
            let deps = s
                .depends_on
                .iter()
                .map(String::as_str)
                .filter(|d| *d != s.id)
                .collect();
            (s.id.as_str(), deps)
        })
        .collect();

    fn visit<'a>(
        node: &'a str,
        graph: &HashMap<&'a str, Vec<&'a str>>,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
        cycles: &mut Vec<Vec<&'a str>>,
    ) {
        marks.insert(node, Mark::Visiting);
        path.push(node);
        for &next in graph.get(node).into_iter().flatten() {
            if !graph.contains_key(next) {
                continue;
            }
            match marks.get(next) {
                Some(Mark::Visiting) => {
                    if let Some(pos) = path.iter().position(|p| *p == next) {
                        let mut cycle = path[pos..].to_vec();
                        cycle.push(next);
                        cycles.push(cycle);
                    }
                }
                Some(Mark::Done) => {}
                None => visit(next, graph, marks, path, cycles),
            }
        }
        path.pop();
        marks.insert(node, Mark::Done);
    }

    let mut marks = HashMap::new();
    let mut cycles = Vec::new();
    for step in steps {
        let id = step.id.as_str();
        if !marks.contains_key(id) {
            visit(id, &graph, &mut marks, &mut Vec::new(), &mut cycles);
        }
    }
    for cycle in cycles {
        findings.push(
            ViolationKind::StepCycle,
            format!("step dependency cycle: {}", cycle.join(" -> ")),
        );
    }
}

fn check_measure(findings: &mut Findings, what: String, m: &Measure) {
    if !(m.amount >= 0.0 && m.amount.is_finite()) {
        findings.push(
            ViolationKind::InvalidMeasure,
            format!("{} amount {} is not a non-negative number", what, m.amount),
        );
    }
    if m.unit.trim().is_empty() {
        findings.push(ViolationKind::InvalidMeasure, format!("{} has no unit", what));
    }
}

fn check_quantities(findings: &mut Findings, recipe: &ResolvedRecipe) {
    if let Some(y) = &recipe.meta.yield_ {
        check_measure(findings, "yield".to_string(), y);
    }
    for ing in &recipe.ingredients {
        match &ing.quantity {
            None => findings.push(
                ViolationKind::InvalidQuantity,
                format!("ingredient '{}' has no quantity", ing.id),
            ),
            Some(q) => match q.as_amount() {
                Some(a) if a >= 0.0 && a.is_finite() => {}
                Some(a) => findings.push(
                    ViolationKind::InvalidQuantity,
                    format!("ingredient '{}' quantity {} is negative", ing.id, a),
                ),
                None => findings.push(
                    ViolationKind::InvalidQuantity,
                    format!("ingredient '{}' quantity '{}' is not numeric", ing.id, q),
                ),
            },
        }
        if ing.unit.trim().is_empty() {
            findings.push(
                ViolationKind::InvalidQuantity,
                format!("ingredient '{}' has no unit", ing.id),
            );
        }
    }
    for step in &recipe.steps {
        if let Some(t) = &step.time {
            check_measure(findings, format!("step '{}' time", step.id), t);
        }
    }
}
