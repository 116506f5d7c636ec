//! CB-005: Dependency graph discovery and cycle detection.
//!
//! Discovery is breadth-first from the root. Every queued node carries its
//! ancestry path of recipe ids; reaching an id already on that path is a
//! cycle even when the version differs. Reaching a known (id, version) off the
//! path is sharing: the edge is recorded, the node is not expanded again.
//!
//! A cycle can close through a shared node that the breadth-first path check
//! never re-expands, so the finished graph is certified by a depth-first walk
//! over (id, version) nodes that carries the ancestry path of ids. Distinct
//! versions that merely share an id on different branches are not a cycle.
//! Kahn over (id, version) nodes then yields the bottom-up resolution order,
//! with alphabetical tie-breaking for determinism.

use super::error::{ResolveError, Result};
use super::store::RecipeLookup;
use super::types::{NodeKey, RecipeDoc};
use super::version::{self, VersionOrder};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use tracing::debug;

/// Edge kind: inheritance or composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeKind {
    Derives,
    Uses { alias: String },
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Derives => write!(f, "derives"),
            Self::Uses { alias } => write!(f, "uses as {}", alias),
        }
    }
}

/// Directed edge from a recipe to its base or dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeKey,
    pub to: NodeKey,
    pub kind: EdgeKind,
}

/// The DAG reachable from one root, keyed by (id, version).
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    root: NodeKey,
    nodes: IndexMap<NodeKey, RecipeDoc>,
    edges: Vec<Edge>,
    order: Vec<NodeKey>,
}

impl DependencyGraph {
    pub fn root(&self) -> &NodeKey {
        &self.root
    }

    /// Nodes in discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeKey> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn doc(&self, key: &NodeKey) -> Option<&RecipeDoc> {
        self.nodes.get(key)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Every node with its bases and dependencies ahead of it.
    pub fn resolution_order(&self) -> &[NodeKey] {
        &self.order
    }

    /// The concrete base a node derives from.
    pub fn base_of(&self, key: &NodeKey) -> Option<&NodeKey> {
        self.edges
            .iter()
            .find(|e| &e.from == key && e.kind == EdgeKind::Derives)
            .map(|e| &e.to)
    }

    /// The concrete dependency chosen for `alias` on a node.
    pub fn dependency_of(&self, key: &NodeKey, alias: &str) -> Option<&NodeKey> {
        self.edges
            .iter()
            .find(|e| {
                &e.from == key && matches!(&e.kind, EdgeKind::Uses { alias: a } if a == alias)
            })
            .map(|e| &e.to)
    }
}

/// Outgoing references of a document: (target id, constraint, kind).
fn child_refs(doc: &RecipeDoc) -> Vec<(String, Option<String>, EdgeKind)> {
    let mut refs = Vec::new();
    if let Some(base) = &doc.derives_from {
        refs.push((base.id.clone(), base.constraint.clone(), EdgeKind::Derives));
    }
    for dep in &doc.uses {
        refs.push((
            dep.recipe.clone(),
            dep.constraint.clone(),
            EdgeKind::Uses {
                alias: dep.id.clone(),
            },
        ));
    }
    refs
}

/// Discover the full dependency graph of `root_id@root_version`.
pub fn build<L: RecipeLookup + ?Sized>(
    lookup: &L,
    root_id: &str,
    root_version: &str,
    order: &dyn VersionOrder,
) -> Result<DependencyGraph> {
    let root = NodeKey::new(root_id, root_version);
    let mut nodes = IndexMap::new();
    nodes.insert(root.clone(), lookup.load(root_id, root_version)?);
    let mut edges = Vec::new();

    let mut queue: VecDeque<(NodeKey, Vec<String>)> = VecDeque::new();
    queue.push_back((root.clone(), vec![root.id.clone()]));

    while let Some((key, path)) = queue.pop_front() {
        let refs = nodes.get(&key).map(child_refs).unwrap_or_default();
        for (child_id, constraint, kind) in refs {
            if let Some(pos) = path.iter().position(|p| *p == child_id) {
                let mut members = path[pos..].to_vec();
                members.push(child_id);
                return Err(ResolveError::CyclicDependency { members });
            }

            let chosen = version::select(lookup, &child_id, constraint.as_deref(), order)?;
            let child = NodeKey::new(child_id, chosen);
            debug!(from = %key, to = %child, kind = %kind, "discovered edge");
            edges.push(Edge {
                from: key.clone(),
                to: child.clone(),
                kind,
            });

            if nodes.contains_key(&child) {
                continue;
            }
            nodes.insert(child.clone(), lookup.load(&child.id, &child.version)?);
            let mut child_path = path.clone();
            child_path.push(child.id.clone());
            queue.push_back((child, child_path));
        }
    }

    certify(&root, &edges)?;

    let keys: Vec<NodeKey> = nodes.keys().cloned().collect();
    let node_edges: Vec<(NodeKey, NodeKey)> = edges
        .iter()
        .map(|e| (e.from.clone(), e.to.clone()))
        .collect();
    let order = kahn(&keys, &node_edges).map_err(|remaining| ResolveError::CyclicDependency {
        members: remaining.iter().map(|k| k.to_string()).collect(),
    })?;

    debug!(root = %root, nodes = nodes.len(), edges = edges.len(), "built dependency graph");
    Ok(DependencyGraph {
        root,
        nodes,
        edges,
        order,
    })
}

/// Kahn's algorithm with sorted tie-breaking. `edges` are (dependent,
/// dependency); dependencies come out first. On a cycle, returns the nodes
/// that could not be ordered, in input order.
fn kahn<K: Clone + Ord + Hash>(
    nodes: &[K],
    edges: &[(K, K)],
) -> std::result::Result<Vec<K>, Vec<K>> {
    let mut in_degree: HashMap<&K, usize> = nodes.iter().map(|n| (n, 0)).collect();
    let mut dependents: HashMap<&K, Vec<&K>> = HashMap::new();

    for (dependent, dependency) in edges {
        dependents.entry(dependency).or_default().push(dependent);
        *in_degree.entry(dependent).or_default() += 1;
    }

    let mut zero_degree: Vec<&K> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(k, _)| *k)
        .collect();
    zero_degree.sort();
    let mut queue: VecDeque<&K> = zero_degree.into_iter().collect();

    let mut order = Vec::new();
    while let Some(current) = queue.pop_front() {
        order.push(current.clone());

        let mut next_ready: Vec<&K> = Vec::new();
        if let Some(waiting) = dependents.get(current) {
            for &dependent in waiting {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        next_ready.push(dependent);
                    }
                }
            }
        }
        next_ready.sort();
        queue.extend(next_ready);
    }

    if order.len() == nodes.len() {
        return Ok(order);
    }
    let ordered: HashSet<&K> = order.iter().collect();
    Err(nodes
        .iter()
        .filter(|n| !ordered.contains(n))
        .cloned()
        .collect())
}

/// Depth-first walk from the root carrying the ancestry path of ids.
/// Fails when a node's id is already on the path.
fn certify(root: &NodeKey, edges: &[Edge]) -> Result<()> {
    let mut children: HashMap<&NodeKey, Vec<&NodeKey>> = HashMap::new();
    for e in edges {
        children.entry(&e.from).or_default().push(&e.to);
    }
    let mut below = HashMap::new();
    walk(root, &children, &mut below, &mut Vec::new()).map(|_| ())
}

/// Returns the ids reachable from `node`, itself included. `below` memoizes
/// them per explored node; a memoized node is walked again only when one of
/// its ids is on the current path, which is how the cycle gets named.
fn walk<'a>(
    node: &'a NodeKey,
    children: &HashMap<&'a NodeKey, Vec<&'a NodeKey>>,
    below: &mut HashMap<&'a NodeKey, HashSet<&'a str>>,
    path: &mut Vec<&'a str>,
) -> Result<HashSet<&'a str>> {
    if let Some(pos) = path.iter().position(|p| *p == node.id) {
        let mut members: Vec<String> = path[pos..].iter().map(|p| p.to_string()).collect();
        members.push(node.id.clone());
        return Err(ResolveError::CyclicDependency { members });
    }
    if let Some(ids) = below.get(node) {
        if !ids.iter().any(|id| path.contains(id)) {
            return Ok(ids.clone());
        }
    }

    path.push(&node.id);
    let mut ids = HashSet::from([node.id.as_str()]);
    for &child in children.get(node).into_iter().flatten() {
        ids.extend(walk(child, children, below, path)?);
    }
    path.pop();

    below.insert(node, ids.clone());
    Ok(ids)
}
