//! CB-003: Version constraints and version selection.
//!
//! Constraints are a small grammar (`^1.2`, `~1.2.3`, `>=1.0, <2.0`,
//! `=1.4.0`, `*`) parsed into a list of comparators that must all hold.
//! The ordering law is pluggable through [`VersionOrder`]; the default is
//! semantic-version precedence (pre-release before release, build metadata
//! ignored).

use super::error::{ResolveError, Result};
use super::store::RecipeLookup;
use semver::{Prerelease, Version};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

/// Ordering law over the known version set.
pub trait VersionOrder {
    fn compare(&self, a: &Version, b: &Version) -> Ordering;
}

/// Standard semantic-version precedence.
#[derive(Debug, Default, Clone, Copy)]
pub struct SemverPrecedence;

impl VersionOrder for SemverPrecedence {
    fn compare(&self, a: &Version, b: &Version) -> Ordering {
        a.cmp_precedence(b)
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

/// A single `op version` test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    pub op: Op,
    pub version: Version,
}

impl Comparator {
    fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    pub fn matches(&self, v: &Version, order: &dyn VersionOrder) -> bool {
        let ord = order.compare(v, &self.version);
        match self.op {
            Op::Eq => ord == Ordering::Equal,
            Op::Gt => ord == Ordering::Greater,
            Op::Ge => ord != Ordering::Less,
            Op::Lt => ord == Ordering::Less,
            Op::Le => ord != Ordering::Greater,
        }
    }
}

/// A parsed constraint expression. No comparators means "any version".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    raw: String,
    comparators: Vec<Comparator>,
}

impl Constraint {
    pub fn any() -> Self {
        Self {
            raw: "*".to_string(),
            comparators: Vec::new(),
        }
    }

    /// Parse a constraint expression.
    ///
    /// Examples:
    /// - `^1.2` → `>=1.2.0, <2.0.0-0`
    /// - `~1.2.3` → `>=1.2.3, <1.3.0-0`
    /// - `>= 1.0, < 2.0` → both comparators
    /// - `1.4.0` or `=1.4.0` → exactly 1.4.0; `=1.4` → any 1.4.x
    pub fn parse(s: &str) -> Result<Self> {
        let raw = s.trim();
        if raw.is_empty() || raw == "*" {
            return Ok(Self::any());
        }

        let mut comparators = Vec::new();
        for term in split_terms(raw) {
            let parsed = parse_term(&term).map_err(|reason| ResolveError::InvalidConstraint {
                constraint: raw.to_string(),
                reason,
            })?;
            comparators.extend(parsed);
        }

        Ok(Self {
            raw: raw.to_string(),
            comparators,
        })
    }

    pub fn is_any(&self) -> bool {
        self.comparators.is_empty()
    }

    pub fn comparators(&self) -> &[Comparator] {
        &self.comparators
    }

    pub fn matches(&self, v: &Version, order: &dyn VersionOrder) -> bool {
        self.comparators.iter().all(|c| c.matches(v, order))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Split on commas and whitespace, gluing a bare operator to its version.
fn split_terms(raw: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for part in raw.split(',') {
        let mut pending = String::new();
        for tok in part.split_whitespace() {
            pending.push_str(tok);
            if tok.chars().all(|c| matches!(c, '<' | '>' | '=' | '^' | '~')) {
                continue;
            }
            terms.push(std::mem::take(&mut pending));
        }
        if !pending.is_empty() {
            terms.push(pending);
        }
    }
    terms
}

fn parse_term(term: &str) -> std::result::Result<Vec<Comparator>, String> {
    if let Some(rest) = term.strip_prefix(">=") {
        let (v, _) = parse_partial(rest)?;
        Ok(vec![Comparator::new(Op::Ge, v)])
    } else if let Some(rest) = term.strip_prefix("<=") {
        let (v, _) = parse_partial(rest)?;
        Ok(vec![Comparator::new(Op::Le, v)])
    } else if let Some(rest) = term.strip_prefix('>') {
        let (v, _) = parse_partial(rest)?;
        Ok(vec![Comparator::new(Op::Gt, v)])
    } else if let Some(rest) = term.strip_prefix('<') {
        let (v, _) = parse_partial(rest)?;
        Ok(vec![Comparator::new(Op::Lt, v)])
    } else if let Some(rest) = term.strip_prefix('^') {
        let (v, given) = parse_partial(rest)?;
        let upper = if v.major > 0 || given == 1 {
            bump(succ(v.major)?, 0, 0)
        } else if v.minor > 0 || given == 2 {
            bump(0, succ(v.minor)?, 0)
        } else {
            bump(0, 0, succ(v.patch)?)
        };
        Ok(vec![Comparator::new(Op::Ge, v), Comparator::new(Op::Lt, upper)])
    } else if let Some(rest) = term.strip_prefix('~') {
        let (v, given) = parse_partial(rest)?;
        let upper = if given == 1 {
            bump(succ(v.major)?, 0, 0)
        } else {
            bump(v.major, succ(v.minor)?, 0)
        };
        Ok(vec![Comparator::new(Op::Ge, v), Comparator::new(Op::Lt, upper)])
    } else {
        let rest = term.strip_prefix('=').unwrap_or(term);
        let (v, given) = parse_partial(rest)?;
        let upper = match given {
            3 => return Ok(vec![Comparator::new(Op::Eq, v)]),
            2 => bump(v.major, succ(v.minor)?, 0),
            _ => bump(succ(v.major)?, 0, 0),
        };
        Ok(vec![Comparator::new(Op::Ge, v), Comparator::new(Op::Lt, upper)])
    }
}

/// Next component value for an exclusive upper bound.
fn succ(n: u64) -> std::result::Result<u64, String> {
    n.checked_add(1)
        .ok_or_else(|| "version component too large".to_string())
}

/// Smallest version at `major.minor.patch`, so upper bounds exclude its pre-releases.
fn bump(major: u64, minor: u64, patch: u64) -> Version {
    let mut v = Version::new(major, minor, patch);
    v.pre = Prerelease::new("0").unwrap_or(Prerelease::EMPTY);
    v
}

/// Parse a possibly partial version (`1`, `1.2`, `1.2.3-rc.1`), padding
/// missing components with zero. Returns the number of components given.
fn parse_partial(s: &str) -> std::result::Result<(Version, usize), String> {
    let s = s.trim();
    let s = s.strip_prefix('v').unwrap_or(s);
    if s.is_empty() {
        return Err("missing version".to_string());
    }
    let core_end = s.find(['-', '+']).unwrap_or(s.len());
    let (core, suffix) = s.split_at(core_end);
    let given = core.split('.').count();
    if given > 3 {
        return Err(format!("too many components in '{}'", s));
    }
    let mut padded = core.to_string();
    for _ in given..3 {
        padded.push_str(".0");
    }
    padded.push_str(suffix);
    Version::parse(&padded)
        .map(|v| (v, given))
        .map_err(|e| format!("'{}': {}", s, e))
}

/// Parse a stored version string.
pub fn parse_version(s: &str) -> std::result::Result<Version, String> {
    parse_partial(s).map(|(v, _)| v)
}

/// Pick the highest known version satisfying `constraint` (absent = any).
pub fn select_from(
    id: &str,
    known: &[String],
    constraint: Option<&str>,
    order: &dyn VersionOrder,
) -> Result<String> {
    if known.is_empty() {
        return Err(ResolveError::UnknownEntity { id: id.to_string() });
    }
    let constraint = match constraint {
        Some(c) => Constraint::parse(c)?,
        None => Constraint::any(),
    };

    let mut best: Option<(Version, &String)> = None;
    for raw in known {
        let v = parse_version(raw).map_err(|reason| ResolveError::InvalidVersion {
            id: id.to_string(),
            version: raw.clone(),
            reason,
        })?;
        if !constraint.matches(&v, order) {
            continue;
        }
        let better = match &best {
            None => true,
            Some((current, _)) => order.compare(&v, current) == Ordering::Greater,
        };
        if better {
            best = Some((v, raw));
        }
    }

    best.map(|(_, raw)| raw.clone())
        .ok_or_else(|| ResolveError::NoMatchingVersion {
            id: id.to_string(),
            constraint: constraint.to_string(),
            known: known.join(", "),
        })
}

/// Select a version of `id` through the lookup.
pub fn select<L: RecipeLookup + ?Sized>(
    lookup: &L,
    id: &str,
    constraint: Option<&str>,
    order: &dyn VersionOrder,
) -> Result<String> {
    let known = lookup.list_versions(id)?;
    let chosen = select_from(id, &known, constraint, order)?;
    debug!(
        recipe = id,
        constraint = constraint.unwrap_or("*"),
        selected = %chosen,
        candidates = known.len(),
        "selected version"
    );
    Ok(chosen)
}

/// Known versions in ascending order; unparsable strings sort first.
pub fn sort_versions(known: &[String], order: &dyn VersionOrder) -> Vec<String> {
    let mut keyed: Vec<(Option<Version>, &String)> = known
        .iter()
        .map(|raw| (parse_version(raw).ok(), raw))
        .collect();
    keyed.sort_by(|(a, ra), (b, rb)| match (a, b) {
        (Some(a), Some(b)) => order.compare(a, b).then_with(|| ra.cmp(rb)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => ra.cmp(rb),
    });
    keyed.into_iter().map(|(_, raw)| raw.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn known(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn ok(c: &str, version: &str) -> bool {
        Constraint::parse(c)
            .unwrap()
            .matches(&v(version), &SemverPrecedence)
    }

    #[test]
    fn test_cb003_caret() {
        assert!(ok("^1.2", "1.2.0"));
        assert!(ok("^1.2", "1.9.3"));
        assert!(!ok("^1.2", "1.1.9"));
        assert!(!ok("^1.2", "2.0.0"));
        assert!(!ok("^1.2", "2.0.0-alpha"));
    }

    #[test]
    fn test_cb003_caret_zero_major() {
        assert!(ok("^0.2.1", "0.2.5"));
        assert!(!ok("^0.2.1", "0.3.0"));
        assert!(ok("^0.0.3", "0.0.3"));
        assert!(!ok("^0.0.3", "0.0.4"));
        assert!(ok("^0", "0.9.9"));
        assert!(!ok("^0", "1.0.0"));
    }

    #[test]
    fn test_cb003_tilde() {
        assert!(ok("~1.2.3", "1.2.9"));
        assert!(!ok("~1.2.3", "1.3.0"));
        assert!(ok("~1", "1.7.0"));
        assert!(!ok("~1", "2.0.0"));
    }

    #[test]
    fn test_cb003_comparator_range() {
        assert!(ok(">=1.0, <2.0", "1.5.0"));
        assert!(!ok(">=1.0, <2.0", "2.0.0"));
        assert!(ok(">= 1.0 < 2.0", "1.0.0"));
        assert!(!ok(">1.0.0", "1.0.0"));
        assert!(ok("<=1.0.0", "1.0.0"));
    }

    #[test]
    fn test_cb003_exact() {
        assert!(ok("1.4.0", "1.4.0"));
        assert!(!ok("1.4.0", "1.4.1"));
        assert!(ok("=1.4", "1.4.7"));
        assert!(!ok("=1.4", "1.5.0"));
    }

    #[test]
    fn test_cb003_prerelease_orders_before_release() {
        assert!(ok("<1.0.0", "1.0.0-rc.1"));
        assert!(ok(">=1.0.0-rc.1", "1.0.0"));
    }

    #[test]
    fn test_cb003_any() {
        assert!(Constraint::parse("*").unwrap().is_any());
        assert!(Constraint::parse("  ").unwrap().is_any());
        assert!(ok("*", "0.0.1-alpha"));
    }

    #[test]
    fn test_cb003_invalid_constraint() {
        let err = Constraint::parse("^banana").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidConstraint { .. }));
        assert!(Constraint::parse(">=").is_err());
        assert!(Constraint::parse("1.2.3.4").is_err());
    }

    #[test]
    fn test_cb003_upper_bound_overflow() {
        for c in ["^18446744073709551615", "~1.18446744073709551615", "=18446744073709551615"] {
            let err = Constraint::parse(c).unwrap_err();
            assert!(
                matches!(err, ResolveError::InvalidConstraint { ref reason, .. } if reason.contains("too large")),
                "{c}: {err}"
            );
        }
        assert!(ok(">=18446744073709551615", "18446744073709551615.0.0"));
    }

    #[test]
    fn test_cb003_select_highest_without_constraint() {
        let k = known(&["1.0.0", "1.10.0", "1.9.0", "2.0.0-beta"]);
        let chosen = select_from("x", &k, None, &SemverPrecedence).unwrap();
        assert_eq!(chosen, "2.0.0-beta");
    }

    #[test]
    fn test_cb003_select_with_caret() {
        let k = known(&["1.0.0", "1.10.0", "1.9.0", "2.0.0"]);
        let chosen = select_from("x", &k, Some("^1.0"), &SemverPrecedence).unwrap();
        assert_eq!(chosen, "1.10.0");
    }

    #[test]
    fn test_cb003_select_no_match() {
        let k = known(&["1.0.0"]);
        let err = select_from("brodo", &k, Some("^2"), &SemverPrecedence).unwrap_err();
        match err {
            ResolveError::NoMatchingVersion { id, constraint, .. } => {
                assert_eq!(id, "brodo");
                assert_eq!(constraint, "^2");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_cb003_select_unknown_entity() {
        let err = select_from("ghost", &[], None, &SemverPrecedence).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownEntity { .. }));
    }

    #[test]
    fn test_cb003_select_invalid_known_version() {
        let k = known(&["1.0.0", "yesterday"]);
        let err = select_from("x", &k, None, &SemverPrecedence).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidVersion { .. }));
    }

    /// Reverse ordering shows the law is pluggable.
    #[test]
    fn test_cb003_pluggable_order() {
        struct Oldest;
        impl VersionOrder for Oldest {
            fn compare(&self, a: &Version, b: &Version) -> Ordering {
                b.cmp_precedence(a)
            }
        }
        let k = known(&["1.0.0", "1.2.0", "1.1.0"]);
        assert_eq!(select_from("x", &k, None, &Oldest).unwrap(), "1.0.0");
    }

    #[test]
    fn test_cb003_sort_versions() {
        let k = known(&["1.10.0", "1.2.0", "1.2.0-rc.1", "0.9.0"]);
        assert_eq!(
            sort_versions(&k, &SemverPrecedence),
            vec!["0.9.0", "1.2.0-rc.1", "1.2.0", "1.10.0"]
        );
    }

    proptest! {
        #[test]
        fn prop_select_returns_maximum(
            triples in proptest::collection::vec((0u64..4, 0u64..4, 0u64..4), 1..12)
        ) {
            let k: Vec<String> = triples
                .iter()
                .map(|(a, b, c)| format!("{a}.{b}.{c}"))
                .collect();
            let chosen = select_from("x", &k, None, &SemverPrecedence).unwrap();
            let max = triples.iter().max().unwrap();
            prop_assert_eq!(chosen, format!("{}.{}.{}", max.0, max.1, max.2));
        }

        #[test]
        fn prop_caret_selection_stays_in_major(
            triples in proptest::collection::vec((1u64..4, 0u64..4, 0u64..4), 1..12),
            major in 1u64..4,
        ) {
            let k: Vec<String> = triples
                .iter()
                .map(|(a, b, c)| format!("{a}.{b}.{c}"))
                .collect();
            let constraint = format!("^{major}");
            match select_from("x", &k, Some(&constraint), &SemverPrecedence) {
                Ok(chosen) => {
                    let chosen = v(&chosen);
                    prop_assert_eq!(chosen.major, major);
                    let max = triples.iter().filter(|t| t.0 == major).max().unwrap();
                    prop_assert_eq!((chosen.minor, chosen.patch), (max.1, max.2));
                }
                Err(_) => prop_assert!(triples.iter().all(|t| t.0 != major)),
            }
        }
    }
}
